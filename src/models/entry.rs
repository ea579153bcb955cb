use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Severity;

/// One completed analysis. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    pub id: String,
    pub owner_id: String,
    /// Labels exactly as submitted (order, casing and duplicates kept).
    pub symptoms: Vec<String>,
    pub severity: Severity,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl SymptomEntry {
    /// Build a fully formed entry with a fresh v4 id.
    pub fn new(
        owner_id: &str,
        symptoms: Vec<String>,
        severity: Severity,
        suggestions: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            symptoms,
            severity,
            suggestions,
            timestamp,
        }
    }
}
