use serde::{Deserialize, Serialize};

use super::model::{lenient, Meal};
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Lightly,
    Moderate,
    Active,
    Very,
}

/// Diet generation input as submitted by the dashboard form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(default, deserialize_with = "lenient::number")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub height: Option<f64>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

/// Parameters that passed validation; the only form the remote store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

impl GenerateParams {
    pub fn validate(&self) -> Result<GenerationRequest, SyncError> {
        Ok(GenerationRequest {
            age: positive("age", self.age)?,
            weight: positive("weight", self.weight)?,
            height: positive("height", self.height)?,
            gender: self.gender,
            activity_level: self.activity_level,
        })
    }
}

fn positive(field: &str, value: Option<f64>) -> Result<f64, SyncError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(_) => Err(SyncError::Validation(format!("{field} must be a positive number"))),
        None => Err(SyncError::Validation(format!("{field} is required"))),
    }
}

/// A hand-written plan to be created remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub meals: Vec<Meal>,
}

impl PlanDraft {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.title.trim().is_empty() {
            return Err(SyncError::Validation("title is required".into()));
        }
        if self.meals.is_empty() {
            return Err(SyncError::Validation("at least one meal is required".into()));
        }
        if let Some(idx) = self.meals.iter().position(|m| m.name.trim().is_empty()) {
            return Err(SyncError::Validation(format!("meal {} has no name", idx + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_form_values_sent_as_strings() {
        let params: GenerateParams = serde_json::from_value(json!({
            "age": "29", "weight": 72.5, "height": "181", "gender": "female", "activityLevel": "moderate"
        }))
        .unwrap();

        let request = params.validate().unwrap();
        assert_eq!(request.age, 29.0);
        assert_eq!(request.height, 181.0);
        assert_eq!(request.gender, Gender::Female);
        assert_eq!(request.activity_level, ActivityLevel::Moderate);
    }

    #[test]
    fn missing_or_non_positive_fields_are_rejected() {
        let params: GenerateParams =
            serde_json::from_value(json!({ "age": "", "weight": 70, "height": 170 })).unwrap();
        assert!(matches!(params.validate(), Err(SyncError::Validation(m)) if m == "age is required"));

        let params = GenerateParams {
            age: Some(30.0),
            weight: Some(-1.0),
            height: Some(170.0),
            ..GenerateParams::default()
        };
        assert!(matches!(params.validate(), Err(SyncError::Validation(_))));
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = GenerateParams {
            age: Some(30.0),
            weight: Some(80.0),
            height: Some(175.0),
            ..GenerateParams::default()
        }
        .validate()
        .unwrap();

        let value = serde_json::to_value(request).unwrap();
        assert_eq!(value["activityLevel"], "sedentary");
        assert_eq!(value["gender"], "male");
    }

    #[test]
    fn draft_requires_title_and_named_meals() {
        let mut draft = PlanDraft {
            title: "  ".into(),
            meals: vec![Meal::new("Breakfast", vec![])],
        };
        assert!(draft.validate().is_err());

        draft.title = "Custom".into();
        assert!(draft.validate().is_ok());

        draft.meals.push(Meal::new("", vec![]));
        assert!(matches!(draft.validate(), Err(SyncError::Validation(m)) if m == "meal 2 has no name"));
    }
}
