//! Identity verification against an external HTTP identity service.
//!
//! Speaks the common `GET /auth/v1/user` shape: the bearer token is
//! forwarded as-is and a 2xx response carries
//! `{ id, email, user_metadata: { name } }`.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;

use super::{AuthError, IdentityVerifier};
use crate::models::Identity;

pub struct RemoteVerifier {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<RemoteUserMetadata>,
}

#[derive(Deserialize)]
struct RemoteUserMetadata {
    #[serde(default)]
    name: Option<String>,
}

impl RemoteVerifier {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn fetch_user(&self, token: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let mut request = self.client.get(&url).bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Identity service request failed");
            AuthError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "Identity service rejected token");
            return Err(AuthError::Rejected);
        }

        let user: RemoteUser = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Identity service returned an unreadable user");
            AuthError::Unavailable(e.to_string())
        })?;

        if user.id.trim().is_empty() {
            return Err(AuthError::Rejected);
        }

        Ok(Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: user.user_metadata.and_then(|m| m.name),
        })
    }
}

impl IdentityVerifier for RemoteVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(self.fetch_user(token))
    }
}
