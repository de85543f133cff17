use std::fmt;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;

use super::claims::JwtKeys;
use crate::state::AppState;

/// Bearer credential of the calling user, passed explicitly to every remote
/// call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    subject: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: subject.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The user the token was issued to; sessions are keyed by it.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("subject", &self.subject)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Credential {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid bearer token");
            (StatusCode::UNAUTHORIZED, "invalid token".to_string())
        })?;

        if claims.is_expired(state.clock.now()) {
            warn!("expired bearer token");
            return Err((StatusCode::UNAUTHORIZED, "token expired".into()));
        }

        let subject = claims
            .subject()
            .ok_or((StatusCode::UNAUTHORIZED, "token has no subject".into()))?;

        Ok(Credential::new(token, subject))
    }
}
