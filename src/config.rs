use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "symptom-advisor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;

/// `SYMPTOM_ADVISOR_DB` value selecting the in-process store.
pub const MEMORY_STORE: &str = ":memory:";

pub const ENV_BIND: &str = "SYMPTOM_ADVISOR_BIND";
pub const ENV_DB: &str = "SYMPTOM_ADVISOR_DB";
pub const ENV_IDENTITY_URL: &str = "SYMPTOM_ADVISOR_IDENTITY_URL";
pub const ENV_IDENTITY_API_KEY: &str = "SYMPTOM_ADVISOR_IDENTITY_API_KEY";
pub const ENV_IDENTITY_TIMEOUT: &str = "SYMPTOM_ADVISOR_IDENTITY_TIMEOUT_SECS";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "symptom_advisor_lib=info,tower_http=info"
}

/// Per-user data directory, falling back to the working directory on
/// platforms without one.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("history.db")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    /// In-process accounts with `/signup` and `/signin`.
    Local,
    Remote {
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_text = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text.parse().map_err(|_| ConfigError::Invalid {
            var: ENV_BIND,
            value: bind_text.clone(),
        })?;

        let store = match get(ENV_DB) {
            Some(v) if v == MEMORY_STORE => StoreConfig::Memory,
            Some(path) => StoreConfig::Sqlite(PathBuf::from(path)),
            None => StoreConfig::Sqlite(default_db_path()),
        };

        let identity = match get(ENV_IDENTITY_URL) {
            None => IdentityConfig::Local,
            Some(base_url) => {
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        var: ENV_IDENTITY_URL,
                        value: base_url,
                    });
                }
                let timeout_secs = match get(ENV_IDENTITY_TIMEOUT) {
                    None => DEFAULT_IDENTITY_TIMEOUT_SECS,
                    Some(v) => v
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or(ConfigError::Invalid {
                            var: ENV_IDENTITY_TIMEOUT,
                            value: v,
                        })?,
                };
                IdentityConfig::Remote {
                    base_url,
                    api_key: get(ENV_IDENTITY_API_KEY),
                    timeout: Duration::from_secs(timeout_secs),
                }
            }
        };

        Ok(Self {
            bind,
            store,
            identity,
        })
    }
}
