use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use time::{Date, Duration};
use tracing::debug;

use crate::plans::{ActivePolicy, SyncController};
use crate::remote::RemoteStore;
use crate::water::DailyCounter;

/// Sessions untouched for longer than this are dropped at midnight.
pub const SESSION_IDLE_DAYS: i64 = 7;

/// State owned by one signed-in user.
pub struct Session {
    pub plans: SyncController,
    water: Mutex<DailyCounter>,
    last_seen: Mutex<Date>,
}

impl Session {
    pub fn water(&self) -> MutexGuard<'_, DailyCounter> {
        self.water.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_seen(&self) -> Date {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self, today: Date) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = today;
    }
}

/// Notifications pushed to connected dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CounterEvent {
    /// Every counter was zeroed by the midnight timer.
    MidnightReset { date: Date },
    /// One user zeroed their counter.
    Reset { subject: String, date: Date },
    Updated { subject: String, value: u32, cap: u32 },
}

impl CounterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MidnightReset { .. } => "midnight_reset",
            Self::Reset { .. } => "reset",
            Self::Updated { .. } => "updated",
        }
    }

    pub fn concerns(&self, subject: &str) -> bool {
        match self {
            Self::MidnightReset { .. } => true,
            Self::Reset { subject: s, .. } | Self::Updated { subject: s, .. } => s == subject,
        }
    }
}

/// Sessions by token subject, created on first use.
pub struct Sessions {
    store: Arc<dyn RemoteStore>,
    policy: ActivePolicy,
    water_cap: u32,
    inner: Mutex<HashMap<String, Arc<Session>>>,
}

impl Sessions {
    pub fn new(store: Arc<dyn RemoteStore>, policy: ActivePolicy, water_cap: u32) -> Self {
        Self {
            store,
            policy,
            water_cap,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn for_subject(&self, subject: &str, today: Date) -> Arc<Session> {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get(subject) {
            session.touch(today);
            return Arc::clone(session);
        }
        debug!(subject, "opening session");
        let session = Arc::new(Session {
            plans: SyncController::new(Arc::clone(&self.store), self.policy),
            water: Mutex::new(DailyCounter::new(self.water_cap, today)),
            last_seen: Mutex::new(today),
        });
        sessions.insert(subject.to_owned(), Arc::clone(&session));
        session
    }

    /// Applies the midnight transition to every open session. Returns how
    /// many counters were zeroed; counters that already rolled over today
    /// are left alone.
    pub fn reset_counters(&self, today: Date) -> usize {
        let sessions: Vec<Arc<Session>> = self.lock().values().cloned().collect();
        sessions
            .iter()
            .filter(|session| session.water().scheduled_check(today))
            .count()
    }

    /// Drops sessions not used for more than [`SESSION_IDLE_DAYS`]. Returns
    /// how many were removed.
    pub fn evict_idle(&self, today: Date) -> usize {
        let cutoff = today - Duration::days(SESSION_IDLE_DAYS);
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|subject, session| {
            let keep = session.last_seen() >= cutoff;
            if !keep {
                debug!(subject = subject.as_str(), "evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Session>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
