//! Transport-agnostic service state.
//!
//! `CoreState` is built once at startup and handed to the HTTP layer
//! inside `ApiContext`. It owns the history store, the auth gate and the
//! clock used to stamp new entries; there are no process-wide globals.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::auth::{AuthGate, IdentityVerifier, LocalAccounts};
use crate::models::{Identity, Severity, SymptomEntry};
use crate::rules::{self, ValidationError};
use crate::store::{HistoryStore, KvStore, StorageError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Hands out strictly increasing UTC instants, even if the wall clock
/// stalls or steps backwards.
#[derive(Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::microseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

pub struct CoreState {
    pub history: HistoryStore,
    pub auth: AuthGate,
    /// Present only when the in-process account directory is the verifier.
    pub accounts: Option<Arc<LocalAccounts>>,
    clock: MonotonicClock,
}

impl CoreState {
    pub fn new(
        kv: Arc<dyn KvStore>,
        verifier: Arc<dyn IdentityVerifier>,
        accounts: Option<Arc<LocalAccounts>>,
    ) -> Self {
        Self {
            history: HistoryStore::new(kv),
            auth: AuthGate::new(verifier),
            accounts,
            clock: MonotonicClock::default(),
        }
    }

    /// Local account directory acting as both verifier and sign-up backend.
    pub fn with_local_accounts(kv: Arc<dyn KvStore>, accounts: Arc<LocalAccounts>) -> Self {
        Self::new(kv, accounts.clone(), Some(accounts))
    }

    /// Run the rule engine and record the result for `identity`.
    ///
    /// The entry is fully built before the single store write; a
    /// validation failure never reaches the store.
    pub fn analyze(
        &self,
        identity: &Identity,
        symptoms: Vec<String>,
        severity: &str,
    ) -> Result<SymptomEntry, CoreError> {
        let severity: Severity = severity.parse()?;
        let suggestions = rules::infer_with(&symptoms, severity)?;

        let entry = SymptomEntry::new(
            &identity.id,
            symptoms,
            severity,
            suggestions,
            self.clock.now(),
        );
        self.history.append(&entry)?;

        tracing::info!(
            owner_id = %identity.id,
            entry_id = %entry.id,
            severity = %entry.severity,
            suggestions = entry.suggestions.len(),
            "Analysis recorded"
        );
        Ok(entry)
    }

    pub fn history_for(&self, identity: &Identity) -> Result<Vec<SymptomEntry>, StorageError> {
        self.history.list_by_owner(&identity.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.into(),
            email: format!("{id}@example.com"),
            display_name: None,
        }
    }

    fn core() -> (CoreState, Arc<MemoryKv>) {
        let kv = Arc::new(MemoryKv::new());
        let accounts = Arc::new(LocalAccounts::with_iterations(1));
        (CoreState::with_local_accounts(kv.clone(), accounts), kv)
    }

    #[test]
    fn clock_never_repeats_or_regresses() {
        let clock = MonotonicClock::default();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn clock_stays_ordered_after_lock_poisoning() {
        let clock = Arc::new(MonotonicClock::default());
        let ahead = Utc::now() + Duration::hours(1);
        let poisoner = clock.clone();
        let _ = std::thread::spawn(move || {
            let mut last = poisoner.last.lock().unwrap();
            *last = Some(ahead);
            panic!("poison the clock lock");
        })
        .join();
        assert!(clock.last.is_poisoned());

        let first = clock.now();
        let second = clock.now();
        assert!(first > ahead);
        assert!(second > first);
    }

    #[test]
    fn analyze_persists_entry_for_caller() {
        let (core, _) = core();
        let alice = identity("alice");
        let entry = core
            .analyze(&alice, vec!["Headache".into(), "Fatigue".into()], "moderate")
            .unwrap();
        assert_eq!(entry.owner_id, "alice");
        assert_eq!(entry.suggestions.len(), 8);

        let listed = core.history_for(&alice).unwrap();
        assert_eq!(listed, vec![entry]);
    }

    #[test]
    fn invalid_input_writes_nothing() {
        let (core, kv) = core();
        let alice = identity("alice");
        assert!(matches!(
            core.analyze(&alice, vec![], "mild"),
            Err(CoreError::Validation(ValidationError::EmptySymptoms))
        ));
        assert!(matches!(
            core.analyze(&alice, vec!["fever".into()], "critical"),
            Err(CoreError::Validation(_))
        ));
        assert!(kv.is_empty());
    }

    #[test]
    fn history_lists_most_recent_first() {
        let (core, _) = core();
        let alice = identity("alice");
        let first = core.analyze(&alice, vec!["cough".into()], "mild").unwrap();
        let second = core.analyze(&alice, vec!["fever".into()], "severe").unwrap();
        let ids: Vec<String> = core.history_for(&alice).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn history_is_scoped_to_identity() {
        let (core, _) = core();
        core.analyze(&identity("bob2"), vec!["cough".into()], "mild").unwrap();
        core.analyze(&identity("bobby"), vec!["cough".into()], "mild").unwrap();
        assert!(core.history_for(&identity("bob")).unwrap().is_empty());
    }
}
