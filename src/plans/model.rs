use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote store. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlanId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Leaf nutrition record. Missing or non-numeric values decode as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::zeroed")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient::zeroed")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient::zeroed")]
    pub carbs: f64,
    #[serde(default, alias = "fat", deserialize_with = "lenient::zeroed")]
    pub fats: f64,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, calories: f64) -> Self {
        Self {
            name: name.into(),
            calories,
            ..Self::default()
        }
    }

    pub fn with_macros(mut self, protein: f64, carbs: f64, fats: f64) -> Self {
        self.protein = protein;
        self.carbs = carbs;
        self.fats = fats;
        self
    }
}

/// A named group of food items. Own totals are optional; when absent they are
/// derived from `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, alias = "foods", deserialize_with = "lenient::list")]
    pub items: Vec<FoodItem>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub calories: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub protein: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub carbs: Option<f64>,
    #[serde(
        default,
        alias = "fat",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub fats: Option<f64>,
}

impl Meal {
    pub fn new(name: impl Into<String>, items: Vec<FoodItem>) -> Self {
        Self {
            name: name.into(),
            items,
            ..Self::default()
        }
    }
}

/// A diet plan as exchanged with the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlanId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub meals: Vec<Meal>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_calories: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_protein: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_carbs: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_fats: Option<f64>,
}

impl Plan {
    pub fn new(title: impl Into<String>, meals: Vec<Meal>) -> Self {
        Self {
            title: title.into(),
            meals,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<PlanId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Drops non-finite numbers that did not come through deserialization
    /// (plans built in code, edit payloads assembled by hand).
    pub fn normalize(&mut self) {
        for total in [
            &mut self.total_calories,
            &mut self.total_protein,
            &mut self.total_carbs,
            &mut self.total_fats,
        ] {
            *total = total.filter(|v| v.is_finite());
        }
        for meal in &mut self.meals {
            for own in [
                &mut meal.calories,
                &mut meal.protein,
                &mut meal.carbs,
                &mut meal.fats,
            ] {
                *own = own.filter(|v| v.is_finite());
            }
            for item in &mut meal.items {
                for value in [
                    &mut item.calories,
                    &mut item.protein,
                    &mut item.carbs,
                    &mut item.fats,
                ] {
                    if !value.is_finite() {
                        *value = 0.0;
                    }
                }
            }
        }
    }
}

/// Deserializers that accept whatever the remote store or a browser form
/// happens to send.
pub(crate) mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(finite))
    }

    pub fn zeroed<'de, D>(d: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(d)?.unwrap_or(0.0))
    }

    pub fn text<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }

    fn finite(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_remote_wire_names() {
        let plan: Plan = serde_json::from_value(json!({
            "_id": "65f0c2",
            "title": "Cut",
            "totalCalories": 1800,
            "meals": [{
                "name": "Breakfast",
                "calories": 400,
                "fat": 12,
                "foods": [{ "name": "Oats", "calories": 300, "protein": 10, "carbs": 54, "fats": 5 }]
            }]
        }))
        .unwrap();

        assert_eq!(plan.id, Some(PlanId::new("65f0c2")));
        assert_eq!(plan.total_calories, Some(1800.0));
        assert_eq!(plan.total_protein, None);
        assert_eq!(plan.meals[0].fats, Some(12.0));
        assert_eq!(plan.meals[0].items[0].carbs, 54.0);
    }

    #[test]
    fn malformed_entries_are_normalized() {
        let plan: Plan = serde_json::from_value(json!({
            "id": "a1",
            "title": null,
            "meals": [{
                "name": "Lunch",
                "calories": "not a number",
                "items": [{ "name": "Rice", "calories": "350", "protein": null }]
            }]
        }))
        .unwrap();

        assert_eq!(plan.title, "");
        assert_eq!(plan.meals[0].calories, None);
        assert_eq!(plan.meals[0].items[0].calories, 350.0);
        assert_eq!(plan.meals[0].items[0].protein, 0.0);

        let empty: Plan = serde_json::from_value(json!({ "_id": "b2", "meals": null })).unwrap();
        assert!(empty.meals.is_empty());
    }

    #[test]
    fn normalize_drops_non_finite_values() {
        let mut plan = Plan::new(
            "Hand built",
            vec![Meal {
                calories: Some(f64::NAN),
                ..Meal::new("Snack", vec![FoodItem::new("Bar", f64::INFINITY)])
            }],
        );
        plan.total_fats = Some(f64::NAN);

        plan.normalize();

        assert_eq!(plan.total_fats, None);
        assert_eq!(plan.meals[0].calories, None);
        assert_eq!(plan.meals[0].items[0].calories, 0.0);
    }

    #[test]
    fn serializes_id_under_remote_name() {
        let plan = Plan::new("Bulk", vec![]).with_id("x9");
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["_id"], "x9");
        assert!(value.get("totalCalories").is_none());
    }
}
