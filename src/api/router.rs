//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Protected routes (outermost → innermost):
//! 1. Auth validator → 2. Audit logger → Handler
//!
//! Account and health routes are unauthenticated. CORS is permissive
//! for every route; the browser front end is served from another origin.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router around a shared `CoreState`.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    let protected = Router::new()
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/history", get(endpoints::history::list))
        .route("/history/:id", get(endpoints::history::detail))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let mut public = Router::new().route("/health", get(endpoints::health::check));
    if ctx.core.accounts.is_some() {
        public = public
            .route("/signup", post(endpoints::accounts::sign_up))
            .route("/signin", post(endpoints::accounts::sign_in));
    }
    let public = public.with_state(ctx);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
}
