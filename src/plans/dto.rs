use serde::Serialize;

use super::aggregate::{item_totals, meal_totals, plan_totals, Totals};
use super::model::{FoodItem, Meal, Plan, PlanId};
use super::sync::DeleteOutcome;

/// A plan as the dashboard renders it: every level carries its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanView {
    pub id: Option<PlanId>,
    pub title: String,
    pub totals: Totals,
    pub meals: Vec<MealView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealView {
    pub name: String,
    pub totals: Totals,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub name: String,
    pub totals: Totals,
}

impl From<&FoodItem> for ItemView {
    fn from(item: &FoodItem) -> Self {
        Self {
            name: item.name.clone(),
            totals: item_totals(item),
        }
    }
}

impl From<&Meal> for MealView {
    fn from(meal: &Meal) -> Self {
        Self {
            name: meal.name.clone(),
            totals: meal_totals(meal),
            items: meal.items.iter().map(ItemView::from).collect(),
        }
    }
}

impl From<&Plan> for PlanView {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.clone(),
            title: plan.title.clone(),
            totals: plan_totals(plan),
            meals: plan.meals.iter().map(MealView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
}
