use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::app::build_app;
use crate::plans::Plan;
use crate::remote::InMemoryRemoteStore;
use crate::state::{fake_config, AppState};
use crate::water::FixedClock;

/// A router over an in-memory store and a frozen clock, with handles kept for
/// assertions.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryRemoteStore>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_plans([])
    }

    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let store = Arc::new(InMemoryRemoteStore::with_plans(plans));
        let clock = Arc::new(FixedClock::new(time::macros::datetime!(2026-10-18 12:00 UTC)));
        let state = AppState::from_parts(Arc::new(fake_config()), store.clone(), clock.clone());
        Self {
            router: build_app(state.clone()),
            state,
            store,
            clock,
        }
    }
}

/// HS256 token for `subject`, expiring in 2100, signed with the test secret.
pub fn token_for(subject: &str) -> String {
    sign_token(&json!({ "sub": subject, "exp": 4_102_444_800_i64 }))
}

pub fn sign_token(payload: &Value) -> String {
    sign_token_with(fake_config().jwt.secret.as_bytes(), payload)
}

pub fn sign_token_with(secret: &[u8], payload: &Value) -> String {
    encode(&Header::default(), payload, &EncodingKey::from_secret(secret))
        .expect("encode test token")
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_raw(router, method, uri, Some(token), body).await
}

pub async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");

    let res = router.clone().oneshot(req).await.expect("infallible");
    let status = res.status();
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
