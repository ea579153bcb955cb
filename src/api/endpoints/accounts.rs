//! Account endpoints, mounted only when the in-process account
//! directory verifies tokens.
//!
//! - `POST /signup`: create an account
//! - `POST /signin`: exchange credentials for an access token

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::{AccountError, LocalAccounts};
use crate::models::Identity;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub user: Identity,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub user: Identity,
}

fn directory(ctx: &ApiContext) -> Result<Arc<LocalAccounts>, ApiError> {
    ctx.core
        .accounts
        .clone()
        .ok_or_else(|| ApiError::NotFound("Account management is not enabled".into()))
}

/// Password hashing is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AccountError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("account task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn sign_up(
    State(ctx): State<ApiContext>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SignUpResponse>, ApiError> {
    let Json(request) = body?;
    let accounts = directory(&ctx)?;

    let user = blocking(move || {
        let email = request.email.ok_or(AccountError::MissingField("Email"))?;
        let password = request.password.ok_or(AccountError::MissingField("Password"))?;
        accounts.register(&email, &password, request.name.as_deref())
    })
    .await?;

    Ok(Json(SignUpResponse { user }))
}

pub async fn sign_in(
    State(ctx): State<ApiContext>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>, ApiError> {
    let Json(request) = body?;
    let accounts = directory(&ctx)?;

    let (access_token, user) = blocking(move || {
        let email = request.email.ok_or(AccountError::InvalidCredentials)?;
        let password = request.password.ok_or(AccountError::InvalidCredentials)?;
        accounts.sign_in(&email, &password)
    })
    .await?;

    Ok(Json(SignInResponse { access_token, user }))
}
