//! Environment-driven configuration.
//!
//! Read once in `main` after `dotenvy` has loaded `.env`, then shared through
//! [`AppState`](crate::state::AppState).

use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Default cap on a multipart body (20 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Read `key`, falling back to `default` when unset.
pub(crate) fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Read a required, non-empty `key`.
pub(crate) fn env_required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Front-end origins allowed by CORS.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Root directory of the attachment store.
    pub upload_dir: PathBuf,
    /// Largest accepted request body, multipart uploads included.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `UPLOAD_DIR`            | `./uploads`             |
    /// | `MAX_UPLOAD_BYTES`      | `20971520`              |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30)?,
            jwt: JwtConfig::from_env()?,
            upload_dir: env_or("UPLOAD_DIR", PathBuf::from("./uploads"))?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}
