//! Bearer-token identity resolution.
//!
//! `AuthGate` is the single place a request's `Authorization` header is
//! turned into an [`Identity`]. The identity verifier behind it is
//! pluggable: the local account directory or an external identity
//! service reached over HTTP.

mod directory;
pub mod local;
pub mod remote;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::models::Identity;

pub use local::{AccountError, LocalAccounts};
pub use remote::RemoteVerifier;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Token rejected")]
    Rejected,

    #[error("Token expired")]
    Expired,

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator that maps an opaque token to an identity.
pub trait IdentityVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, AuthError>>;
}

#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolve the raw `Authorization` header value.
    pub async fn verify(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header)?;
        self.verifier.verify(token).await
    }
}

/// Extract `<token>` from `Bearer <token>`. The scheme is matched
/// case-insensitively; the token must be a single non-empty word.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
