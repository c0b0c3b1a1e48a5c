//! Graph Propagator - bounded breadth-first diffusion of one learning event
//!
//! Traversal rules:
//! - start at the event source (depth 0), follow outgoing edges only
//! - an object is recorded at most once; the first recorded path wins
//! - updates below `min_magnitude` are dropped and never expanded
//! - each enqueued node carries its own update magnitude into the next hop
//! - hard ceilings: `MAX_PROPAGATION_DEPTH` hops, `MAX_PROPAGATION_TARGETS` updates

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Instant;

use crate::config::PropagationConfig;
use crate::magnitude::{build_indirect_update, calculate_base_magnitude};
use crate::types::{
    IndirectUpdate, ObjectStates, ObjectUpdateEvent, PropagationResult, TransferRelation,
    TransferType, MAX_PROPAGATION_DEPTH, MAX_PROPAGATION_TARGETS,
};

/// Outgoing-edge index over a flat relation list, built once per run
pub struct RelationIndex<'a> {
    relations: &'a [TransferRelation],
    outgoing: HashMap<&'a str, Vec<usize>>,
}

impl<'a> RelationIndex<'a> {
    pub fn build(relations: &'a [TransferRelation]) -> Self {
        let mut outgoing: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, relation) in relations.iter().enumerate() {
            outgoing
                .entry(relation.source_id.as_str())
                .or_default()
                .push(idx);
        }
        Self { relations, outgoing }
    }

    /// Outgoing edges of `object_id`, in input order
    pub fn outgoing(&self, object_id: &str) -> impl Iterator<Item = &'a TransferRelation> + '_ {
        let relations = self.relations;
        self.outgoing
            .get(object_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &relations[idx])
    }

    pub fn out_degree(&self, object_id: &str) -> usize {
        self.outgoing.get(object_id).map_or(0, Vec::len)
    }

    pub fn edge_count(&self) -> usize {
        self.relations.len()
    }
}

/// Hop limit actually used for a run
pub fn effective_max_depth(config: &PropagationConfig) -> u32 {
    config.max_depth.min(MAX_PROPAGATION_DEPTH)
}

/// Compute the indirect updates produced by `event`.
///
/// `states` is read only; apply the returned updates separately.
pub fn propagate_update(
    event: &ObjectUpdateEvent,
    relations: &[TransferRelation],
    states: &ObjectStates,
    config: &PropagationConfig,
) -> PropagationResult {
    let source_id = event.source_object_id.as_str();

    if !config.enabled {
        return PropagationResult::empty(source_id);
    }
    if !states.contains_key(source_id) {
        tracing::debug!(source = %source_id, "No state for propagation source, skipping");
        return PropagationResult::empty(source_id);
    }

    let started = Instant::now();
    let index = RelationIndex::build(relations);
    let max_depth = effective_max_depth(config);
    let base_magnitude = calculate_base_magnitude(event, config);

    let mut updates: Vec<IndirectUpdate> = Vec::new();
    let mut by_type: BTreeMap<TransferType, f64> = BTreeMap::new();
    let mut truncated = false;

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(source_id);

    let mut queue: VecDeque<(&str, u32, f64)> = VecDeque::new();
    queue.push_back((source_id, 0, base_magnitude));

    'bfs: while let Some((current_id, depth, inbound)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(current_state) = states.get(current_id) else {
            continue;
        };

        for relation in index.outgoing(current_id) {
            let target_id = relation.target_id.as_str();
            if visited.contains(target_id) {
                continue;
            }
            let Some(target_state) = states.get(target_id) else {
                continue;
            };

            let next_depth = depth + 1;
            let update = build_indirect_update(
                current_state,
                target_state,
                relation,
                next_depth,
                inbound,
                config,
            );
            if update.magnitude < config.min_magnitude {
                continue;
            }
            if updates.len() >= MAX_PROPAGATION_TARGETS {
                truncated = true;
                break 'bfs;
            }

            visited.insert(target_id);
            *by_type.entry(update.relationship_type).or_insert(0.0) += update.magnitude;
            if next_depth < max_depth {
                queue.push_back((target_id, next_depth, update.magnitude));
            }
            updates.push(update);
        }
    }

    let total_magnitude = updates.iter().map(|u| u.magnitude).sum();
    let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    tracing::debug!(
        source = %source_id,
        out_degree = index.out_degree(source_id),
        base_magnitude,
        affected = updates.len(),
        total_magnitude,
        truncated,
        edges = index.edge_count(),
        "Propagation computed"
    );

    PropagationResult {
        source_object_id: source_id.to_string(),
        total_affected: updates.len(),
        updates,
        total_magnitude,
        by_relationship_type: by_type,
        processing_time_ms,
        truncated,
    }
}
