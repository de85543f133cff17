use crate::config::{AppConfig, JwtConfig, RemoteConfig};
use crate::plans::ActivePolicy;
use crate::remote::{HttpRemoteStore, InMemoryRemoteStore, RemoteStore};
use crate::session::{CounterEvent, Sessions};
use crate::water::{Clock, FixedClock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RemoteStore>,
    pub clock: Arc<dyn Clock>,
    pub sessions: Arc<Sessions>,
    pub events: broadcast::Sender<CounterEvent>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = if config.remote.is_memory() {
            tracing::warn!("REMOTE_BASE_URL=memory; plans live in this process only");
            Arc::new(InMemoryRemoteStore::new()) as Arc<dyn RemoteStore>
        } else {
            Arc::new(HttpRemoteStore::new(
                &config.remote.base_url,
                Duration::from_secs(config.remote.timeout_secs),
            )?) as Arc<dyn RemoteStore>
        };
        let clock = Arc::new(SystemClock::new(config.utc_offset()?)) as Arc<dyn Clock>;

        Ok(Self::from_parts(Arc::new(config), store, clock))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = Arc::new(Sessions::new(
            Arc::clone(&store),
            config.plan_policy,
            config.water_cap,
        ));
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            config,
            store,
            clock,
            sessions,
            events,
        }
    }

    /// In-memory store and a clock frozen at a fixed instant.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(fake_config()),
            Arc::new(InMemoryRemoteStore::new()),
            Arc::new(FixedClock::new(time::macros::datetime!(2026-10-18 12:00 UTC))),
        )
    }
}

pub fn fake_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        remote: RemoteConfig {
            base_url: crate::config::MEMORY_BACKEND.into(),
            timeout_secs: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: None,
            audience: None,
        },
        plan_policy: ActivePolicy::Single,
        water_cap: 8,
        utc_offset_minutes: 0,
    }
}
