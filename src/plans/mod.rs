mod aggregate;
mod dto;
pub mod handlers;
mod model;
mod params;
mod repo;
mod sync;

use crate::state::AppState;
use axum::Router;

pub use aggregate::{item_totals, meal_totals, plan_totals, Totals};
pub use dto::{DeleteResponse, MealView, PlanView};
pub use model::{FoodItem, Meal, Plan, PlanId};
pub use params::{ActivityLevel, Gender, GenerateParams, GenerationRequest, PlanDraft};
pub use repo::{ActivePolicy, PlanRepository};
pub use sync::{DeleteOutcome, SyncController};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
