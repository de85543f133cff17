use anyhow::Context;
use serde::Deserialize;
use time::UtcOffset;

use crate::plans::ActivePolicy;

/// Selects the process-local store instead of the HTTP backend.
pub const MEMORY_BACKEND: &str = "memory";

/// Verification settings for tokens issued by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn is_memory(&self) -> bool {
        self.base_url.eq_ignore_ascii_case(MEMORY_BACKEND)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub remote: RemoteConfig,
    pub jwt: JwtConfig,
    pub plan_policy: ActivePolicy,
    pub water_cap: u32,
    pub utc_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let remote = RemoteConfig {
            base_url: var("REMOTE_BASE_URL")
                .unwrap_or_else(|| "http://localhost:7000/api".into()),
            timeout_secs: parsed(&var, "REMOTE_TIMEOUT_SECS")?.unwrap_or(15),
        };
        let jwt = JwtConfig {
            secret: var("JWT_SECRET")
                .filter(|s| !s.is_empty())
                .context("JWT_SECRET is required")?,
            issuer: var("JWT_ISSUER").filter(|s| !s.is_empty()),
            audience: var("JWT_AUDIENCE").filter(|s| !s.is_empty()),
        };
        let config = Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed(&var, "APP_PORT")?.unwrap_or(8080),
            remote,
            jwt,
            plan_policy: parsed(&var, "PLAN_POLICY")?.unwrap_or_default(),
            water_cap: parsed(&var, "WATER_CAP")?.unwrap_or(8),
            utc_offset_minutes: parsed(&var, "APP_UTC_OFFSET_MINUTES")?.unwrap_or(0),
        };
        config.utc_offset()?;
        Ok(config)
    }

    /// Offset that decides where the local day begins.
    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_whole_seconds(self.utc_offset_minutes * 60)
            .with_context(|| format!("APP_UTC_OFFSET_MINUTES out of range: {}", self.utc_offset_minutes))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = [("JWT_SECRET", "dev-secret")]
            .iter()
            .chain(pairs)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.remote.base_url, "http://localhost:7000/api");
        assert_eq!(config.remote.timeout_secs, 15);
        assert_eq!(config.plan_policy, ActivePolicy::Single);
        assert_eq!(config.water_cap, 8);
        assert_eq!(config.utc_offset().unwrap(), UtcOffset::UTC);
        assert!(!config.remote.is_memory());
        assert_eq!(config.jwt.secret, "dev-secret");
        assert_eq!(config.jwt.issuer, None);
    }

    #[test]
    fn jwt_secret_is_required() {
        let err = AppConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let config = config(&[("JWT_ISSUER", "auth"), ("JWT_AUDIENCE", "nutriplan")]).unwrap();
        assert_eq!(config.jwt.issuer.as_deref(), Some("auth"));
        assert_eq!(config.jwt.audience.as_deref(), Some("nutriplan"));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("REMOTE_BASE_URL", "memory"),
            ("PLAN_POLICY", "multi"),
            ("WATER_CAP", "12"),
            ("APP_UTC_OFFSET_MINUTES", "-300"),
        ])
        .unwrap();
        assert!(config.remote.is_memory());
        assert_eq!(config.plan_policy, ActivePolicy::Multi);
        assert_eq!(config.water_cap, 12);
        assert_eq!(config.utc_offset().unwrap().whole_hours(), -5);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = config(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));

        assert!(config(&[("PLAN_POLICY", "several")]).is_err());
        assert!(config(&[("APP_UTC_OFFSET_MINUTES", "100000")]).is_err());
    }
}
