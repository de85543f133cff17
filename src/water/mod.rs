mod clock;
mod counter;
pub mod handlers;
mod scheduler;

use crate::state::AppState;
use axum::Router;

pub use clock::{until_next_midnight, Clock, FixedClock, SystemClock};
pub use counter::{CounterSnapshot, DailyCounter};
pub use scheduler::{run_midnight_reset, spawn_midnight_reset};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::water_routes())
}
