//! Local account directory.
//!
//! Stores PBKDF2-SHA256 password hashes and hashed access tokens.
//! Plaintext tokens are handed to the caller once, at sign-in, and never
//! kept. Accounts live in memory or in the history database, see
//! `directory`.

use chrono::{Duration, Utc};
use futures_util::future::{self, BoxFuture};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use super::directory::{Account, AccountDirectory, MemoryDirectory, SqliteDirectory};
use super::{generate_token, hash_token, AuthError, IdentityVerifier};
use crate::db::{DatabaseError, SharedConnection};
use crate::models::Identity;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub(crate) const SALT_LENGTH: usize = 16;

/// Access tokens expire one hour after sign-in.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Account storage failure: {0}")]
    Storage(String),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        AccountError::Storage(err.to_string())
    }
}

pub struct LocalAccounts {
    directory: Box<dyn AccountDirectory>,
    iterations: u32,
    token_ttl: Duration,
}

impl LocalAccounts {
    /// In-memory directory; accounts are gone when the process exits.
    pub fn new() -> Self {
        Self::with_iterations(PBKDF2_ITERATIONS)
    }

    /// In-memory directory. Lower iteration counts are only meant for tests.
    pub fn with_iterations(iterations: u32) -> Self {
        Self::from_directory(Box::new(MemoryDirectory::default()), iterations)
    }

    /// Accounts and sessions in the `accounts` and `sessions` tables
    /// reachable through `conn`.
    pub fn persistent(conn: SharedConnection, iterations: u32) -> Self {
        Self::from_directory(Box::new(SqliteDirectory::new(conn)), iterations)
    }

    fn from_directory(directory: Box<dyn AccountDirectory>, iterations: u32) -> Self {
        Self {
            directory,
            iterations,
            token_ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    fn derive(&self, password: &str, salt: &[u8; SALT_LENGTH]) -> [u8; 32] {
        let mut out = [0u8; 32];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut out);
        out
    }

    /// Create an account. Email is trimmed and lowercased.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Identity, AccountError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AccountError::MissingField("Email"));
        }
        if password.is_empty() {
            return Err(AccountError::MissingField("Password"));
        }

        let salt: [u8; SALT_LENGTH] = rand::random();
        let password_hash = self.derive(password, &salt);
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email,
            display_name: name.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
        };

        self.directory.add_account(Account {
            identity: identity.clone(),
            salt,
            password_hash,
        })?;
        tracing::info!(user_id = %identity.id, "Account registered");
        Ok(identity)
    }

    /// Check credentials and issue a fresh access token.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<(String, Identity), AccountError> {
        let email = normalize_email(email);
        let account = self
            .directory
            .account_by_email(&email)?
            .ok_or(AccountError::InvalidCredentials)?;

        let actual = self.derive(password, &account.salt);
        if actual.ct_eq(&account.password_hash).unwrap_u8() == 0 {
            return Err(AccountError::InvalidCredentials);
        }

        let token = generate_token();
        let now = Utc::now();
        self.directory.add_session(
            hash_token(&token),
            &account.identity.id,
            now + self.token_ttl,
            now,
        )?;
        Ok((token, account.identity))
    }

    fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let (identity, expires_at) = self
            .directory
            .session_identity(&hash_token(token))
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .ok_or(AuthError::Rejected)?;
        if Utc::now() >= expires_at {
            return Err(AuthError::Expired);
        }
        Ok(identity)
    }
}

impl Default for LocalAccounts {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityVerifier for LocalAccounts {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(future::ready(self.resolve(token)))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
