use std::sync::Arc;

use nutriplan::{app, config::AppConfig, state::AppState, water};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutriplan=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.addr();
    tracing::info!(
        remote = %config.remote.base_url,
        policy = ?config.plan_policy,
        water_cap = config.water_cap,
        "configuration loaded"
    );

    let state = AppState::init(config)?;

    let midnight = water::spawn_midnight_reset(
        Arc::clone(&state.sessions),
        Arc::clone(&state.clock),
        state.events.clone(),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };

    let result = app::serve(app::build_app(state), &addr, shutdown).await;
    midnight.abort();
    result
}
