//! Propagation Engine - unified entry point for indirect updates
//!
//! Combines:
//! - Graph Propagator for computing updates
//! - Update Aggregator for merging signals that share a target
//! - State Applier for committing them
//! - Update History for auditing what was applied

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregator::aggregate_by_target;
use crate::applier::{apply_indirect_updates, SharedObjectStates};
use crate::config::PropagationConfig;
use crate::history::{create_history_entries, UpdateHistory};
use crate::propagator::propagate_update;
use crate::types::{
    IndirectUpdate, ObjectStates, ObjectUpdateEvent, PropagationResult, TransferRelation,
};

/// Outcome of a compute-and-commit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPropagation {
    pub result: PropagationResult,
    /// Number of state records touched
    pub applied: usize,
}

pub struct PropagationEngine {
    config: PropagationConfig,
    history: UpdateHistory,
}

impl Default for PropagationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PropagationEngine {
    pub fn new(config: PropagationConfig) -> Self {
        Self {
            config,
            history: UpdateHistory::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PropagationConfig::default())
    }

    pub fn with_history(config: PropagationConfig, history: UpdateHistory) -> Self {
        Self { config, history }
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn history(&self) -> &UpdateHistory {
        &self.history
    }

    /// Compute indirect updates without touching state
    pub fn propagate(
        &self,
        event: &ObjectUpdateEvent,
        relations: &[TransferRelation],
        states: &ObjectStates,
    ) -> PropagationResult {
        propagate_update(event, relations, states, &self.config)
    }

    /// Compute, optionally merge per target, apply and record history.
    pub fn propagate_and_apply(
        &self,
        event: &ObjectUpdateEvent,
        relations: &[TransferRelation],
        states: &mut ObjectStates,
        aggregate: bool,
    ) -> AppliedPropagation {
        let result = propagate_update(event, relations, states, &self.config);
        if result.is_empty() {
            return AppliedPropagation { result, applied: 0 };
        }

        let to_apply = if aggregate {
            aggregate_by_target(&result.updates)
        } else {
            result.updates.clone()
        };
        let applied = self.commit(&to_apply, states);

        tracing::info!(
            source = %event.source_object_id,
            affected = result.total_affected,
            applied,
            total_magnitude = result.total_magnitude,
            "Indirect updates applied"
        );

        AppliedPropagation { result, applied }
    }

    /// Compute results for many events in parallel against one snapshot.
    ///
    /// Nothing is applied; pass the results to [`Self::apply_batch`].
    pub fn propagate_batch(
        &self,
        events: &[ObjectUpdateEvent],
        relations: &[TransferRelation],
        states: &ObjectStates,
    ) -> Vec<PropagationResult> {
        events
            .par_iter()
            .map(|event| propagate_update(event, relations, states, &self.config))
            .collect()
    }

    /// Merge every update across `results` by target and apply once.
    pub fn apply_batch(&self, results: &[PropagationResult], states: &mut ObjectStates) -> usize {
        let all: Vec<IndirectUpdate> = results
            .iter()
            .flat_map(|r| r.updates.iter().cloned())
            .collect();
        if all.is_empty() {
            return 0;
        }

        let merged = aggregate_by_target(&all);
        let applied = self.commit(&merged, states);
        tracing::info!(
            runs = results.len(),
            raw_updates = all.len(),
            applied,
            "Batched indirect updates applied"
        );
        applied
    }

    /// Propagate against a store shared with other callers.
    ///
    /// Traversal reads a snapshot; writes lock one object at a time and
    /// resolve last-writer-wins against concurrent runs.
    pub fn propagate_shared(
        &self,
        event: &ObjectUpdateEvent,
        relations: &[TransferRelation],
        states: &SharedObjectStates,
    ) -> AppliedPropagation {
        if !self.config.enabled || !states.contains(&event.source_object_id) {
            tracing::debug!(source = %event.source_object_id, "Shared propagation skipped");
            return AppliedPropagation {
                result: PropagationResult::empty(event.source_object_id.as_str()),
                applied: 0,
            };
        }

        let snapshot = states.snapshot();
        let result = propagate_update(event, relations, &snapshot, &self.config);
        if result.is_empty() {
            return AppliedPropagation { result, applied: 0 };
        }

        let now = Utc::now();
        let applied = states.apply(&result.updates, now);
        self.history.record_result(&result, now);

        AppliedPropagation { result, applied }
    }

    fn commit(&self, updates: &[IndirectUpdate], states: &mut ObjectStates) -> usize {
        let now = Utc::now();
        let applied = apply_indirect_updates(updates, states, now);
        self.history.record(create_history_entries(updates, now));
        applied
    }
}
