use axum::extract::FromRef;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::JwtConfig;
use crate::state::AppState;

/// The subset of the auth service's JWT payload this service reads.
///
/// Tokens are issued by the auth service and signed with the secret it shares
/// with this service; the verified subject keys the session.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// `sub`, falling back to the `id` claim some issuers use instead.
    pub fn subject(&self) -> Option<String> {
        [&self.sub, &self.id]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.exp.is_some_and(|exp| exp <= now.unix_timestamp())
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Checks the HS256 signature, and issuer/audience when configured.
    /// Expiry is left to the caller, which compares against the app clock.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        match &self.audience {
            Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(std::slice::from_ref(iss));
        }
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(subject = ?data.claims.subject(), "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use time::macros::datetime;

    fn keys(issuer: Option<&str>, audience: Option<&str>) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "shared-secret".into(),
            issuer: issuer.map(Into::into),
            audience: audience.map(Into::into),
        })
    }

    fn sign_with(secret: &[u8], payload: Value) -> String {
        encode(&Header::default(), &payload, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn sign(payload: Value) -> String {
        sign_with(b"shared-secret", payload)
    }

    #[test]
    fn reads_subject_from_sub_or_id() {
        let keys = keys(None, None);
        let claims = keys.verify(&sign(json!({ "sub": "u-1", "exp": 4_000_000_000i64 }))).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("u-1"));

        let claims = keys.verify(&sign(json!({ "id": "65f0aa", "iat": 1 }))).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("65f0aa"));

        let claims = keys.verify(&sign(json!({ "id": 42 }))).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("42"));

        let claims = keys.verify(&sign(json!({ "role": "user" }))).unwrap();
        assert_eq!(claims.subject(), None);
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let forged = sign_with(b"attacker-key", json!({ "sub": "alice" }));
        assert!(keys(None, None).verify(&forged).is_err());
    }

    #[test]
    fn issuer_and_audience_are_checked_when_configured() {
        let keys = keys(Some("auth"), Some("nutriplan"));
        let good = sign(json!({ "sub": "u", "iss": "auth", "aud": "nutriplan" }));
        assert!(keys.verify(&good).is_ok());

        let wrong_aud = sign(json!({ "sub": "u", "iss": "auth", "aud": "other" }));
        assert!(keys.verify(&wrong_aud).is_err());

        let no_iss = sign(json!({ "sub": "u", "aud": "nutriplan" }));
        assert!(keys.verify(&no_iss).is_err());
    }

    #[test]
    fn expiry_is_compared_against_the_given_instant() {
        let keys = keys(None, None);
        let now = datetime!(2026-03-01 12:00 UTC);
        let claims = keys.verify(&sign(json!({ "sub": "u", "exp": now.unix_timestamp() - 1 }))).unwrap();
        assert!(claims.is_expired(now));

        let claims = keys.verify(&sign(json!({ "sub": "u", "exp": now.unix_timestamp() + 60 }))).unwrap();
        assert!(!claims.is_expired(now));

        let claims = keys.verify(&sign(json!({ "sub": "u" }))).unwrap();
        assert!(!claims.is_expired(now));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(keys(None, None).verify("not-a-jwt").is_err());
    }
}
