use serde::{Deserialize, Serialize};

/// Authenticated caller, produced only by an identity verifier.
///
/// Handlers receive this from the auth middleware and use `id` as the
/// history owner. It is never rebuilt from request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}
