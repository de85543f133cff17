use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::clock::{until_next_midnight, Clock};
use crate::session::{CounterEvent, Sessions};

/// Zeroes every session's counter at each local midnight, for as long as the
/// process runs. Lazy rollover in `DailyCounter` covers a late or missed tick.
pub fn spawn_midnight_reset(
    sessions: Arc<Sessions>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<CounterEvent>,
) -> JoinHandle<()> {
    tokio::spawn(run_midnight_reset(sessions, clock, events))
}

pub async fn run_midnight_reset(
    sessions: Arc<Sessions>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<CounterEvent>,
) {
    let mut armed_on = clock.today();
    loop {
        let wait = until_next_midnight(clock.now());
        debug!(wait_secs = wait.as_secs(), "midnight reset armed");
        tokio::time::sleep(wait).await;

        let today = clock.today();
        if today == armed_on {
            // woke before midnight; re-arm for the remainder
            continue;
        }
        armed_on = today;

        let reset = sessions.reset_counters(today);
        let evicted = sessions.evict_idle(today);
        info!(%today, reset, evicted, "daily counters reset");
        // no subscribers is fine
        let _ = events.send(CounterEvent::MidnightReset { date: today });
    }
}
