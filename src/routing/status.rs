//! Per-handler registration status.
//!
//! # Responsibilities
//! - Record the outcome of every pattern a handler requested
//! - Provide read-only snapshots for introspection
//!
//! # Design Decisions
//! - One record per registered handler, created by `add`, dropped by `remove`
//! - Backed by `DashMap` so readers never take the registry write lock

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;

use crate::routing::handler::{FailureReason, HandlerId, Outcome};

/// Outcomes for every pattern one handler requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusRecord {
    patterns: BTreeMap<String, Outcome>,
}

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for a pattern, replacing any previous one.
    pub fn set(&mut self, pattern: &str, outcome: Outcome) {
        self.patterns.insert(pattern.to_string(), outcome);
    }

    pub fn shadowed(&mut self, pattern: &str) {
        self.set(pattern, Outcome::Failure(FailureReason::ShadowedByOtherService));
    }

    pub fn get(&self, pattern: &str) -> Option<Outcome> {
        self.patterns.get(pattern).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Outcome)> {
        self.patterns.iter().map(|(p, o)| (p.as_str(), *o))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Status records for all registered handlers.
#[derive(Debug, Default)]
pub struct StatusLedger {
    records: DashMap<HandlerId, StatusRecord>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: HandlerId, record: StatusRecord) {
        self.records.insert(id, record);
    }

    pub fn remove(&self, id: HandlerId) -> Option<StatusRecord> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    /// Update the outcome of one pattern for an already recorded handler.
    /// Ignored if the handler has no record.
    pub fn record(&self, id: HandlerId, pattern: &str, outcome: Outcome) {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.set(pattern, outcome);
        }
    }

    pub fn get(&self, id: HandlerId) -> Option<StatusRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.records.contains_key(&id)
    }

    /// Copy of every record, ordered by handler id.
    pub fn snapshot(&self) -> BTreeMap<HandlerId, StatusRecord> {
        self.records
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_replaces_outcome() {
        let mut record = StatusRecord::new();
        record.shadowed("/a");
        record.set("/a", Outcome::Success);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("/a"), Some(Outcome::Success));
    }

    #[test]
    fn test_ledger_record_requires_existing_entry() {
        let ledger = StatusLedger::new();
        ledger.record(HandlerId(1), "/a", Outcome::Success);
        assert!(ledger.is_empty());

        ledger.insert(HandlerId(1), StatusRecord::new());
        ledger.record(HandlerId(1), "/a", Outcome::Success);
        assert_eq!(ledger.get(HandlerId(1)).unwrap().get("/a"), Some(Outcome::Success));

        assert!(ledger.remove(HandlerId(1)).is_some());
        assert!(ledger.remove(HandlerId(1)).is_none());
    }

    #[test]
    fn test_snapshot_serializes_by_pattern() {
        let ledger = StatusLedger::new();
        let mut record = StatusRecord::new();
        record.set("/a", Outcome::Success);
        ledger.insert(HandlerId(7), record);

        let json = serde_json::to_value(ledger.snapshot()).unwrap();
        assert_eq!(json["7"]["/a"]["outcome"], "success");
    }
}
