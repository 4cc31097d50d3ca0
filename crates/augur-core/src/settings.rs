//! Relay configuration.
//!
//! All values are read once at startup and passed explicitly; nothing in
//! the hot path consults the environment.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::retry::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy};

/// Default listen address for the relay server.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";

/// Default credential lifetime: seven days, in minutes.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 10_080;

/// Configuration errors surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Values consumed by the relay core and its adapters.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Shared API secret clients must present as `api_key_auth`.
    pub api_secret: String,
    /// HS256 signing secret for bearer credentials.
    pub signing_secret: String,
    /// Lifetime applied when issuing credentials.
    pub token_lifetime_minutes: i64,
    /// Inference backend endpoint, `host:port` or full `ws://` URL.
    pub upstream_endpoint: String,
    /// Retry behavior for upstream sessions.
    pub retry: RetryPolicy,
    /// Listen address of the relay server.
    pub bind_addr: String,
    /// Configured current event key; empty disables the static lookup.
    pub event_key: Option<String>,
}

impl RelayConfig {
    /// Load from the process environment.
    ///
    /// Required: `API_KEY_AUTH`, `SECRET_KEY`, `INFERENCE_ENDPOINT`.
    /// Optional with defaults: `ACCESS_TOKEN_EXPIRE_MINUTES`,
    /// `RETRY_COUNT`, `RETRY_TIME`, `BIND_ADDR`, `EVENT_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (injectable for tests).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let retry_attempts =
            parse_or("RETRY_COUNT", &lookup, DEFAULT_RETRY_ATTEMPTS)?;
        let retry_delay_secs =
            parse_or("RETRY_TIME", &lookup, DEFAULT_RETRY_DELAY.as_secs())?;

        Ok(Self {
            api_secret: require("API_KEY_AUTH", &lookup)?,
            signing_secret: require("SECRET_KEY", &lookup)?,
            token_lifetime_minutes: parse_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                &lookup,
                DEFAULT_TOKEN_LIFETIME_MINUTES,
            )?,
            upstream_endpoint: require("INFERENCE_ENDPOINT", &lookup)?,
            retry: RetryPolicy::new(
                retry_attempts,
                retry_attempts,
                Duration::from_secs(retry_delay_secs),
            ),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            event_key: lookup("EVENT_KEY").filter(|key| !key.is_empty()),
        })
    }

    /// Full upstream WebSocket URL, accepting bare `host:port` endpoints.
    #[must_use]
    pub fn upstream_url(&self) -> String {
        if self.upstream_endpoint.starts_with("ws://")
            || self.upstream_endpoint.starts_with("wss://")
        {
            self.upstream_endpoint.clone()
        } else {
            format!("ws://{}", self.upstream_endpoint)
        }
    }
}

fn require(
    key: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}
