//! History & Reporting - bounded audit log and run summaries

use std::collections::VecDeque;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::types::{IndirectUpdate, PropagationResult, UpdateHistoryEntry, MAX_UPDATE_HISTORY};

pub fn create_history_entries(
    updates: &[IndirectUpdate],
    timestamp: DateTime<Utc>,
) -> Vec<UpdateHistoryEntry> {
    updates
        .iter()
        .map(|u| UpdateHistoryEntry {
            timestamp,
            source_object_id: u.source_object_id.clone(),
            target_object_id: u.target_object_id.clone(),
            magnitude: u.magnitude,
            relationship_type: u.relationship_type,
        })
        .collect()
}

/// Append-only audit log, oldest entries evicted first once full
pub struct UpdateHistory {
    entries: RwLock<VecDeque<UpdateHistoryEntry>>,
    max_entries: usize,
}

impl Default for UpdateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_UPDATE_HISTORY)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn record(&self, entries: impl IntoIterator<Item = UpdateHistoryEntry>) {
        let mut log = self.entries.write();
        log.extend(entries);
        while log.len() > self.max_entries {
            log.pop_front();
        }
    }

    pub fn record_result(&self, result: &PropagationResult, timestamp: DateTime<Utc>) {
        self.record(create_history_entries(&result.updates, timestamp));
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<UpdateHistoryEntry> {
        self.entries.read().iter().rev().take(limit).cloned().collect()
    }

    /// Entries where the object appears as source or target, oldest first
    pub fn entries_for_object(&self, object_id: &str) -> Vec<UpdateHistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.source_object_id == object_id || e.target_object_id == object_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Human-readable summary of a propagation run
pub fn summarize_propagation(result: &PropagationResult) -> String {
    let mut out = format!(
        "Propagation from {}: {} objects affected, total magnitude {:.3}",
        result.source_object_id, result.total_affected, result.total_magnitude
    );
    if result.truncated {
        out.push_str(" (truncated)");
    }
    for (transfer_type, magnitude) in &result.by_relationship_type {
        let _ = write!(out, "\n  {transfer_type}: {magnitude:.3}");
    }
    out
}
