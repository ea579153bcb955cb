//! Bearer token authentication middleware.
//!
//! Resolves `Authorization: Bearer <token>` through the `AuthGate` and
//! injects the resulting `Identity` into request extensions. Handlers
//! behind this layer take the owner id from that identity only.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let header = req
        .headers()
        .get("Authorization")
        .map(|v| v.to_str().map_err(|_| ApiError::Unauthorized))
        .transpose()?
        .map(str::to_owned);

    let identity = ctx.core.auth.verify(header.as_deref()).await?;
    req.extensions_mut().insert(identity);

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}
