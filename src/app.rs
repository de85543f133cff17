use std::future::Future;
use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{plans, water};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(plans::router())
                .merge(water::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(
    app: Router,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_utils::{send, send_raw, sign_token, sign_token_with, token_for, TestApp};

    #[tokio::test]
    async fn health_needs_no_credential() {
        let app = TestApp::new();
        let (status, _) = send_raw(&app.router, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected_before_any_remote_call() {
        let app = TestApp::new();
        let token = sign_token(&json!({ "sub": "alice", "exp": 1_700_000_000_i64 }));

        let (status, _) =
            send_raw(&app.router, Method::POST, "/api/v1/plans/refresh", Some(&token), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(app.store.calls().is_empty());
    }

    #[tokio::test]
    async fn tokens_signed_with_another_key_cannot_read_a_session() {
        let app = TestApp::new();
        send(&app.router, Method::POST, "/api/v1/water/increment", &token_for("alice"), None).await;

        let forged = sign_token_with(b"attacker-key", &json!({ "sub": "alice" }));
        let (status, body) =
            send_raw(&app.router, Method::GET, "/api/v1/water", Some(&forged), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::Value::Null);
    }
}
