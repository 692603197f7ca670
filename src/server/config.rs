use std::net::SocketAddr;

use thiserror::Error;

use crate::core::DEFAULT_PRODUCER;

/// Default per-upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Expected bearer token. `None` makes every `/embed` call fail with 500.
    pub token: Option<String>,
    pub max_upload_bytes: usize,
    pub bind: SocketAddr,
    /// `/Producer` stamped into every output.
    pub producer: String,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ServiceConfig {
    /// Defaults with the given token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            producer: DEFAULT_PRODUCER.to_string(),
        }
    }

    /// Read `FACTURX_TOKEN`, `FACTURX_MAX_UPLOAD_BYTES`, `FACTURX_BIND`
    /// and `FACTURX_PRODUCER` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("FACTURX_TOKEN").filter(|token| !token.is_empty());

        let max_upload_bytes = match lookup("FACTURX_MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "FACTURX_MAX_UPLOAD_BYTES",
                        reason: "must be greater than zero".into(),
                    });
                }
                Ok(limit) => limit,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "FACTURX_MAX_UPLOAD_BYTES",
                        reason: format!("{raw:?}: {e}"),
                    });
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let bind_raw = lookup("FACTURX_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.trim().parse().map_err(|e| ConfigError::Invalid {
            key: "FACTURX_BIND",
            reason: format!("{bind_raw:?}: {e}"),
        })?;

        let producer = lookup("FACTURX_PRODUCER")
            .filter(|producer| !producer.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRODUCER.to_string());

        Ok(Self {
            token,
            max_upload_bytes,
            bind,
            producer,
        })
    }
}
