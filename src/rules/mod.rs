//! Deterministic suggestion engine.
//!
//! Maps a symptom list and a severity to between one and eight advisory
//! strings. No I/O, no randomness: identical input always yields the
//! identical sequence. The output is built tier by tier
//! (severity → keyword groups → wellness → top-up) and then truncated.
//! Duplicate text across tiers is kept as is.

pub mod catalog;

use thiserror::Error;

use crate::models::Severity;
use catalog::{
    severity_pair, KEYWORD_GROUPS, MAX_SUGGESTIONS, TOP_UP, TOP_UP_THRESHOLD, WELLNESS,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Symptoms are required")]
    EmptySymptoms,

    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Entry point for untyped input (HTTP bodies). Validates severity text
/// and symptom presence before evaluating.
pub fn infer<S: AsRef<str>>(symptoms: &[S], severity: &str) -> Result<Vec<String>, ValidationError> {
    let severity: Severity = severity.parse()?;
    infer_with(symptoms, severity)
}

/// Typed entry point. Still rejects an empty symptom list.
pub fn infer_with<S: AsRef<str>>(
    symptoms: &[S],
    severity: Severity,
) -> Result<Vec<String>, ValidationError> {
    if symptoms.is_empty() {
        return Err(ValidationError::EmptySymptoms);
    }

    let lowered: Vec<String> = symptoms.iter().map(|s| s.as_ref().to_lowercase()).collect();
    let mut out: Vec<&'static str> = Vec::with_capacity(16);

    out.extend(severity_pair(severity));

    for group in KEYWORD_GROUPS {
        if group.matches(&lowered) {
            out.extend(group.suggestions);
        }
    }

    out.extend(WELLNESS);

    if out.len() < TOP_UP_THRESHOLD {
        out.extend(TOP_UP);
    }

    out.truncate(MAX_SUGGESTIONS);
    Ok(out.into_iter().map(String::from).collect())
}
