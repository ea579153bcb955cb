//! API endpoint handlers.
//!
//! Handlers stay thin: they unpack the request, call into `CoreState`
//! or the account directory, and shape the JSON response.

pub mod accounts;
pub mod analyze;
pub mod health;
pub mod history;
