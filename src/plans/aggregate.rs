//! Derived nutrition totals.
//!
//! Totals the remote store supplies win field by field; anything missing is
//! folded up from the level below. The fold substitutes 0 for absent or
//! non-finite input and never returns NaN.

use std::iter::Sum;
use std::ops::Add;

use serde::Serialize;

use super::model::{FoodItem, Meal, Plan};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub calories: f64,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fats_grams: f64,
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Totals) -> Totals {
        Totals {
            calories: self.calories + rhs.calories,
            protein_grams: self.protein_grams + rhs.protein_grams,
            carbs_grams: self.carbs_grams + rhs.carbs_grams,
            fats_grams: self.fats_grams + rhs.fats_grams,
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::default(), Add::add)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn prefer(own: Option<f64>, derived: f64) -> f64 {
    match own {
        Some(v) if v.is_finite() => v,
        _ => finite_or_zero(derived),
    }
}

pub fn item_totals(item: &FoodItem) -> Totals {
    Totals {
        calories: finite_or_zero(item.calories),
        protein_grams: finite_or_zero(item.protein),
        carbs_grams: finite_or_zero(item.carbs),
        fats_grams: finite_or_zero(item.fats),
    }
}

pub fn meal_totals(meal: &Meal) -> Totals {
    let derived: Totals = meal.items.iter().map(item_totals).sum();
    Totals {
        calories: prefer(meal.calories, derived.calories),
        protein_grams: prefer(meal.protein, derived.protein_grams),
        carbs_grams: prefer(meal.carbs, derived.carbs_grams),
        fats_grams: prefer(meal.fats, derived.fats_grams),
    }
}

pub fn plan_totals(plan: &Plan) -> Totals {
    let derived: Totals = plan.meals.iter().map(meal_totals).sum();
    Totals {
        calories: prefer(plan.total_calories, derived.calories),
        protein_grams: prefer(plan.total_protein, derived.protein_grams),
        carbs_grams: prefer(plan.total_carbs, derived.carbs_grams),
        fats_grams: prefer(plan.total_fats, derived.fats_grams),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal_of(items: Vec<FoodItem>) -> Meal {
        Meal::new("meal", items)
    }

    #[test]
    fn meal_sums_items_and_defaults_missing_macros() {
        let mut with_protein = FoodItem::new("egg", 150.0);
        with_protein.protein = 10.0;
        let meal = meal_of(vec![FoodItem::new("toast", 200.0), with_protein]);

        assert_eq!(
            meal_totals(&meal),
            Totals {
                calories: 350.0,
                protein_grams: 10.0,
                carbs_grams: 0.0,
                fats_grams: 0.0,
            }
        );
    }

    #[test]
    fn plan_folds_meal_totals() {
        let breakfast = meal_of(vec![FoodItem::new("a", 200.0), FoodItem::new("b", 150.0)]);
        let dinner = meal_of(vec![FoodItem::new("c", 400.0)]);
        let plan = Plan::new("day", vec![breakfast, dinner]);

        assert_eq!(plan_totals(&plan).calories, 750.0);
    }

    #[test]
    fn declared_totals_win_per_field() {
        let mut meal = meal_of(vec![FoodItem::new("rice", 300.0).with_macros(6.0, 65.0, 1.0)]);
        meal.calories = Some(320.0);
        let mut plan = Plan::new("day", vec![meal]);
        plan.total_protein = Some(120.0);

        let totals = plan_totals(&plan);
        assert_eq!(totals.calories, 320.0);
        assert_eq!(totals.protein_grams, 120.0);
        assert_eq!(totals.carbs_grams, 65.0);
        assert_eq!(totals.fats_grams, 1.0);
    }

    #[test]
    fn non_finite_input_never_leaks() {
        let mut meal = meal_of(vec![FoodItem::new("bad", f64::NAN), FoodItem::new("ok", 100.0)]);
        meal.protein = Some(f64::INFINITY);
        let mut plan = Plan::new("day", vec![meal]);
        plan.total_carbs = Some(f64::NAN);

        let totals = plan_totals(&plan);
        assert_eq!(totals.calories, 100.0);
        assert_eq!(totals.protein_grams, 0.0);
        assert_eq!(totals.carbs_grams, 0.0);
        assert!(totals.fats_grams.is_finite());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let plan = Plan::new("day", vec![meal_of(vec![FoodItem::new("x", 250.0)])]);
        assert_eq!(plan_totals(&plan), plan_totals(&plan));
    }

    #[test]
    fn empty_plan_is_zero() {
        assert_eq!(plan_totals(&Plan::default()), Totals::default());
    }
}
