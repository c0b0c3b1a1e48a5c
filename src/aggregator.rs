//! Update Aggregator - merges indirect updates that share a target
//!
//! The i-th update (0-indexed, arrival order) is weighted by 1 / (1 + 0.5 i),
//! so redundant signals contribute less and less.

use std::collections::HashMap;

use crate::sanitize::{clamp_finite, clamp_unit, finite_or_zero};
use crate::types::{IndirectUpdate, TransferType};

const DIMINISHING_FACTOR: f64 = 0.5;
const MAX_AGGREGATED_DIFFICULTY: f64 = -1.0;
const MAX_AGGREGATED_STABILITY: f64 = 5.0;
const MAX_AGGREGATED_PRIORITY: f64 = 0.5;

#[inline]
pub fn diminishing_weight(index: usize) -> f64 {
    1.0 / (1.0 + index as f64 * DIMINISHING_FACTOR)
}

/// Combine updates into one. Empty input yields `None`; a single update is
/// returned unchanged.
pub fn aggregate_updates(updates: &[IndirectUpdate]) -> Option<IndirectUpdate> {
    let first = updates.first()?;
    if updates.len() == 1 {
        return Some(first.clone());
    }

    let mut magnitude = 0.0;
    let mut difficulty = 0.0;
    let mut stability = 0.0;
    let mut priority = 0.0;
    let mut confidence = 0.0;
    let mut weight_sum = 0.0;
    let mut depth = first.depth;

    for (i, update) in updates.iter().enumerate() {
        let w = diminishing_weight(i);
        magnitude += finite_or_zero(update.magnitude) * w;
        difficulty += finite_or_zero(update.difficulty_adjustment) * w;
        stability += finite_or_zero(update.stability_boost) * w;
        priority += finite_or_zero(update.priority_adjustment) * w;
        confidence += finite_or_zero(update.confidence) * w;
        weight_sum += w;
        depth = depth.min(update.depth);
    }

    Some(IndirectUpdate {
        target_object_id: first.target_object_id.clone(),
        source_object_id: first.source_object_id.clone(),
        relationship_type: dominant_relationship(updates),
        magnitude: magnitude.min(1.0),
        difficulty_adjustment: difficulty.max(MAX_AGGREGATED_DIFFICULTY),
        stability_boost: stability.min(MAX_AGGREGATED_STABILITY),
        priority_adjustment: clamp_finite(priority, -MAX_AGGREGATED_PRIORITY, MAX_AGGREGATED_PRIORITY),
        confidence: clamp_unit(confidence / weight_sum),
        depth,
        reason: format!("aggregated from {} updates", updates.len()),
    })
}

/// Most frequent relationship type; ties go to the type seen first
fn dominant_relationship(updates: &[IndirectUpdate]) -> TransferType {
    let mut counts: Vec<(TransferType, usize)> = Vec::new();
    for update in updates {
        match counts.iter_mut().find(|(t, _)| *t == update.relationship_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((update.relationship_type, 1)),
        }
    }

    let mut best = counts[0];
    for &(t, count) in &counts[1..] {
        if count > best.1 {
            best = (t, count);
        }
    }
    best.0
}

/// Group updates by target (first-seen order) and aggregate each group
pub fn aggregate_by_target(updates: &[IndirectUpdate]) -> Vec<IndirectUpdate> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<IndirectUpdate>> = HashMap::new();

    for update in updates {
        let key = update.target_object_id.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(update.clone());
    }

    order
        .into_iter()
        .filter_map(|key| groups.get(key).and_then(|group| aggregate_updates(group)))
        .collect()
}
