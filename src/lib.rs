pub mod api; // HTTP surface: router, middleware, endpoints, server
pub mod auth; // Bearer token → Identity
pub mod config;
pub mod core_state; // Service context shared by all handlers
pub mod db;
pub mod models;
pub mod rules; // Suggestion engine
pub mod store; // Owner-scoped key/value storage + history

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::auth::local::PBKDF2_ITERATIONS;
use crate::auth::{LocalAccounts, RemoteVerifier};
use crate::config::{IdentityConfig, ServerConfig, StoreConfig};
use crate::core_state::CoreState;
use crate::store::{KvStore, MemoryKv, SqliteKv, StorageError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Identity client error: {0}")]
    Identity(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
}

/// Build the service context described by `config`.
pub fn build_core(config: &ServerConfig) -> Result<CoreState, StartupError> {
    build_core_with(config, PBKDF2_ITERATIONS)
}

/// Local accounts share the history store's backend: a SQLite history
/// keeps accounts and sessions in the same database file.
fn build_core_with(
    config: &ServerConfig,
    pbkdf2_iterations: u32,
) -> Result<CoreState, StartupError> {
    let (kv, accounts): (Arc<dyn KvStore>, LocalAccounts) = match &config.store {
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store; history and accounts are lost on exit");
            (
                Arc::new(MemoryKv::new()),
                LocalAccounts::with_iterations(pbkdf2_iterations),
            )
        }
        StoreConfig::Sqlite(path) => {
            let kv = SqliteKv::open(path)?;
            let accounts = LocalAccounts::persistent(kv.connection(), pbkdf2_iterations);
            (Arc::new(kv), accounts)
        }
    };

    let core = match &config.identity {
        IdentityConfig::Local => {
            tracing::info!("Using local account directory");
            CoreState::with_local_accounts(kv, Arc::new(accounts))
        }
        IdentityConfig::Remote {
            base_url,
            api_key,
            timeout,
        } => {
            tracing::info!(%base_url, "Using remote identity service");
            let verifier = RemoteVerifier::new(base_url, api_key.clone(), *timeout)?;
            CoreState::new(kv, Arc::new(verifier), None)
        }
    };
    Ok(core)
}

pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Symptom Advisor starting v{}", config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    let core = Arc::new(build_core(&config)?);
    let mut server = api::start_server_on(core, config.bind).await?;

    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn build_core_with_memory_store_and_local_accounts() {
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            store: StoreConfig::Memory,
            identity: IdentityConfig::Local,
        };
        let core = build_core(&config).unwrap();
        assert!(core.accounts.is_some());
    }

    #[tokio::test]
    async fn accounts_and_history_survive_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            store: StoreConfig::Sqlite(tmp.path().join("history.db")),
            identity: IdentityConfig::Local,
        };

        let (user, entry, token) = {
            let core = build_core_with(&config, 1).unwrap();
            let accounts = core.accounts.clone().unwrap();
            let user = accounts.register("ann@example.com", "pw", None).unwrap();
            let (token, _) = accounts.sign_in("ann@example.com", "pw").unwrap();
            let entry = core.analyze(&user, vec!["Fever".into()], "mild").unwrap();
            (user, entry, token)
        };

        let core = build_core_with(&config, 1).unwrap();
        let accounts = core.accounts.clone().unwrap();

        let (new_token, signed_in) = accounts.sign_in("ann@example.com", "pw").unwrap();
        assert_eq!(signed_in.id, user.id);
        assert_eq!(
            accounts.register("ann@example.com", "pw", None),
            Err(auth::AccountError::EmailTaken)
        );

        for token in [token, new_token] {
            let header = format!("Bearer {token}");
            let identity = core.auth.verify(Some(header.as_str())).await.unwrap();
            assert_eq!(core.history_for(&identity).unwrap(), vec![entry.clone()]);
        }
    }

    #[test]
    fn memory_store_keeps_accounts_in_memory() {
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            store: StoreConfig::Memory,
            identity: IdentityConfig::Local,
        };
        let first = build_core_with(&config, 1).unwrap();
        first
            .accounts
            .as_ref()
            .unwrap()
            .register("ann@example.com", "pw", None)
            .unwrap();

        let second = build_core_with(&config, 1).unwrap();
        assert!(matches!(
            second.accounts.as_ref().unwrap().sign_in("ann@example.com", "pw"),
            Err(auth::AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn build_core_with_sqlite_and_remote_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            store: StoreConfig::Sqlite(tmp.path().join("history.db")),
            identity: IdentityConfig::Remote {
                base_url: "http://127.0.0.1:9".into(),
                api_key: None,
                timeout: Duration::from_secs(1),
            },
        };
        let core = build_core(&config).unwrap();
        assert!(core.accounts.is_none());
        assert!(tmp.path().join("history.db").exists());
    }
}
