//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: resolves the bearer token to an identity
//! 2. Audit logger: logs after auth, has the owner id

pub mod audit;
pub mod auth;
