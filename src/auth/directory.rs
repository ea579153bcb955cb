//! Where local accounts and their sessions are kept.
//!
//! `MemoryDirectory` lives for the life of the process and backs `:memory:`
//! deployments. `SqliteDirectory` writes the `accounts` and `sessions`
//! tables of the history database, so accounts outlive a restart and keep
//! their user id.

use std::collections::HashMap;
use std::sync::{MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::local::{AccountError, SALT_LENGTH};
use crate::db::repository::{self, AccountRow, SessionRow};
use crate::db::SharedConnection;
use crate::models::Identity;

#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub identity: Identity,
    pub salt: [u8; SALT_LENGTH],
    pub password_hash: [u8; 32],
}

pub(crate) trait AccountDirectory: Send + Sync {
    /// `EmailTaken` if the normalized email is already registered.
    fn add_account(&self, account: Account) -> Result<(), AccountError>;

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Record a session and drop every session already expired at `now`.
    fn add_session(
        &self,
        token_hash: [u8; 32],
        user_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AccountError>;

    /// The account behind a token hash, with the session's expiry.
    fn session_identity(
        &self,
        token_hash: &[u8; 32],
    ) -> Result<Option<(Identity, DateTime<Utc>)>, AccountError>;
}

// ═══════════════════════════════════════════════════════════
// In-process
// ═══════════════════════════════════════════════════════════

struct Session {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    /// Keyed by normalized email.
    accounts: HashMap<String, Account>,
    /// user id → normalized email.
    emails: HashMap<String, String>,
    /// Keyed by SHA-256 of the access token.
    sessions: HashMap<[u8; 32], Session>,
}

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    tables: RwLock<Tables>,
}

impl AccountDirectory for MemoryDirectory {
    fn add_account(&self, account: Account) -> Result<(), AccountError> {
        let mut tables = self.tables.write().map_err(|_| AccountError::LockPoisoned)?;
        let email = account.identity.email.clone();
        if tables.accounts.contains_key(&email) {
            return Err(AccountError::EmailTaken);
        }
        tables
            .emails
            .insert(account.identity.id.clone(), email.clone());
        tables.accounts.insert(email, account);
        Ok(())
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.read().map_err(|_| AccountError::LockPoisoned)?;
        Ok(tables.accounts.get(email).cloned())
    }

    fn add_session(
        &self,
        token_hash: [u8; 32],
        user_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let mut tables = self.tables.write().map_err(|_| AccountError::LockPoisoned)?;
        tables.sessions.retain(|_, s| s.expires_at > now);
        tables.sessions.insert(
            token_hash,
            Session {
                user_id: user_id.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn session_identity(
        &self,
        token_hash: &[u8; 32],
    ) -> Result<Option<(Identity, DateTime<Utc>)>, AccountError> {
        let tables = self.tables.read().map_err(|_| AccountError::LockPoisoned)?;
        let found = tables.sessions.get(token_hash).and_then(|session| {
            let email = tables.emails.get(&session.user_id)?;
            let account = tables.accounts.get(email)?;
            Some((account.identity.clone(), session.expires_at))
        });
        Ok(found)
    }
}

// ═══════════════════════════════════════════════════════════
// SQLite
// ═══════════════════════════════════════════════════════════

pub(crate) struct SqliteDirectory {
    conn: SharedConnection,
}

impl SqliteDirectory {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AccountError> {
        self.conn.lock().map_err(|_| AccountError::LockPoisoned)
    }
}

fn account_from_row(row: AccountRow) -> Result<Account, AccountError> {
    let salt = <[u8; SALT_LENGTH]>::try_from(row.salt.as_slice())
        .map_err(|_| AccountError::Storage(format!("account {}: bad salt", row.user_id)))?;
    let password_hash = <[u8; 32]>::try_from(row.password_hash.as_slice())
        .map_err(|_| AccountError::Storage(format!("account {}: bad hash", row.user_id)))?;
    Ok(Account {
        identity: Identity {
            id: row.user_id,
            email: row.email,
            display_name: row.display_name,
        },
        salt,
        password_hash,
    })
}

impl AccountDirectory for SqliteDirectory {
    fn add_account(&self, account: Account) -> Result<(), AccountError> {
        let row = AccountRow {
            user_id: account.identity.id,
            email: account.identity.email,
            display_name: account.identity.display_name,
            salt: account.salt.to_vec(),
            password_hash: account.password_hash.to_vec(),
            created_at: Utc::now().to_rfc3339(),
        };
        let conn = self.lock()?;
        repository::insert_account(&conn, &row).map_err(|e| {
            if e.is_constraint_violation() {
                AccountError::EmailTaken
            } else {
                e.into()
            }
        })
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let conn = self.lock()?;
        repository::get_account_by_email(&conn, email)?
            .map(account_from_row)
            .transpose()
    }

    fn add_session(
        &self,
        token_hash: [u8; 32],
        user_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let conn = self.lock()?;
        let purged = repository::delete_expired_sessions(&conn, now.timestamp_millis())?;
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions removed");
        }
        repository::insert_session(
            &conn,
            &SessionRow {
                token_hash: token_hash.to_vec(),
                user_id: user_id.to_string(),
                expires_at: expires_at.timestamp_millis(),
            },
        )?;
        Ok(())
    }

    fn session_identity(
        &self,
        token_hash: &[u8; 32],
    ) -> Result<Option<(Identity, DateTime<Utc>)>, AccountError> {
        let conn = self.lock()?;
        let Some((row, expires_ms)) = repository::get_session_account(&conn, token_hash)? else {
            return Ok(None);
        };
        let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_ms)
            .ok_or_else(|| AccountError::Storage(format!("session expiry out of range: {expires_ms}")))?;
        Ok(Some((account_from_row(row)?.identity, expires_at)))
    }
}
