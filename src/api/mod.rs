//! HTTP API.
//!
//! Exposes analysis and history over JSON. Protected routes go through
//! the middleware stack Auth → Audit → Handler; account and health routes
//! are public.
//!
//! The router is composable; `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server_on, ApiServer, ServerError};
pub use types::ApiContext;
