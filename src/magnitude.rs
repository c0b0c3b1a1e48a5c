//! Magnitude Model - strength of a learning event and its per-edge attenuation
//!
//! Base magnitude:
//!   stage_weight(previous_stage) × accuracy × update_type_weight
//!
//! Edge magnitude:
//!   inbound × strength × relationship_weight × decay^(depth-1) × confidence
//!
//! Both are clamped to [0, 1]. Decay is geometric in hop count, so influence
//! dies out even on dense or cyclic graphs.

use crate::config::PropagationConfig;
use crate::sanitize::{clamp_finite, clamp_unit, finite_or_zero};
use crate::types::{
    IndirectUpdate, ObjectPropagationState, ObjectUpdateEvent, TransferRelation,
    MAX_MASTERY_STAGE,
};

/// Weight of a stage advance, indexed by the stage the object left
const STAGE_ADVANCE_WEIGHTS: [f64; MAX_MASTERY_STAGE as usize] = [0.6, 0.8, 1.0, 0.9];
/// Weight when the stage held or regressed
const MAINTENANCE_WEIGHT: f64 = 0.4;

const DIFFICULTY_FACTOR: f64 = 0.5;
/// Extra damping when the target is already easier than its parent
const EASIER_TARGET_DAMPING: f64 = 0.5;
const STABILITY_REFERENCE_DAYS: f64 = 30.0;
const STABILITY_FACTOR: f64 = 3.0;
const MAX_STABILITY_BOOST: f64 = 3.0;
const PRIORITY_FACTOR: f64 = 0.3;
const PRIORITY_FREEZE_STAGE: u8 = 3;

/// Stage-improvement weight of an event
pub fn stage_weight(event: &ObjectUpdateEvent) -> f64 {
    if !event.is_stage_advance() {
        return MAINTENANCE_WEIGHT;
    }
    let idx = event.previous_stage.min(MAX_MASTERY_STAGE - 1) as usize;
    STAGE_ADVANCE_WEIGHTS[idx]
}

pub fn calculate_base_magnitude(event: &ObjectUpdateEvent, config: &PropagationConfig) -> f64 {
    let stage = stage_weight(event);
    let accuracy = clamp_unit(event.accuracy);
    let type_weight = clamp_unit(config.update_type_weights.get(event.update_type));

    clamp_unit(stage * accuracy * type_weight)
}

/// Attenuated magnitude for one edge at `depth` hops from the event source.
///
/// Returns 0 for depth 0 or beyond `config.max_depth`.
pub fn calculate_propagation_magnitude(
    inbound_magnitude: f64,
    relation: &TransferRelation,
    depth: u32,
    config: &PropagationConfig,
) -> f64 {
    if depth == 0 || depth > config.max_depth {
        return 0.0;
    }

    let weight = clamp_unit(config.relationship_weights.get(relation.transfer_type));
    let decay = clamp_unit(config.depth_decay_factor).powi((depth - 1) as i32);

    clamp_unit(
        clamp_unit(inbound_magnitude)
            * clamp_unit(relation.strength)
            * weight
            * decay
            * clamp_unit(relation.confidence),
    )
}

pub fn calculate_difficulty_adjustment(
    magnitude: f64,
    source: &ObjectPropagationState,
    target: &ObjectPropagationState,
) -> f64 {
    let mut adjustment = -finite_or_zero(magnitude) * DIFFICULTY_FACTOR;
    if finite_or_zero(target.difficulty) < finite_or_zero(source.difficulty) {
        adjustment *= EASIER_TARGET_DAMPING;
    }
    adjustment
}

/// Stability boost in days, in [0, 3]
pub fn calculate_stability_boost(magnitude: f64, source: &ObjectPropagationState) -> f64 {
    let boost = finite_or_zero(magnitude)
        * (finite_or_zero(source.stability) / STABILITY_REFERENCE_DAYS)
        * STABILITY_FACTOR;
    clamp_finite(boost, 0.0, MAX_STABILITY_BOOST)
}

pub fn calculate_priority_adjustment(magnitude: f64, target: &ObjectPropagationState) -> f64 {
    // mastered items are not de-prioritized further by indirect effects
    if target.mastery_stage >= PRIORITY_FREEZE_STAGE {
        return 0.0;
    }
    clamp_finite(-finite_or_zero(magnitude) * PRIORITY_FACTOR, -1.0, 1.0)
}

/// Assemble the indirect update that `relation` carries from `source` to
/// `target` at the given hop count.
pub fn build_indirect_update(
    source: &ObjectPropagationState,
    target: &ObjectPropagationState,
    relation: &TransferRelation,
    depth: u32,
    inbound_magnitude: f64,
    config: &PropagationConfig,
) -> IndirectUpdate {
    let magnitude = calculate_propagation_magnitude(inbound_magnitude, relation, depth, config);

    let difficulty_adjustment = if config.update_difficulty {
        calculate_difficulty_adjustment(magnitude, source, target)
    } else {
        0.0
    };
    let stability_boost = if config.update_stability {
        calculate_stability_boost(magnitude, source)
    } else {
        0.0
    };
    let priority_adjustment = if config.update_priority {
        calculate_priority_adjustment(magnitude, target)
    } else {
        0.0
    };

    IndirectUpdate {
        target_object_id: target.object_id.clone(),
        source_object_id: source.object_id.clone(),
        relationship_type: relation.transfer_type,
        magnitude,
        difficulty_adjustment,
        stability_boost,
        priority_adjustment,
        confidence: clamp_unit(relation.confidence),
        depth,
        reason: format!(
            "{} transfer from {} ({} hop{})",
            relation.transfer_type,
            source.object_id,
            depth,
            if depth == 1 { "" } else { "s" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransferType, UpdateType};
    use chrono::Utc;

    const EPSILON: f64 = 1e-9;

    fn event(prev: u8, new: u8, accuracy: f64, update_type: UpdateType) -> ObjectUpdateEvent {
        ObjectUpdateEvent {
            source_object_id: "src".into(),
            update_type,
            previous_stage: prev,
            new_stage: new,
            accuracy,
            response_time_ms: 1500,
            component: "lexical".into(),
            timestamp: Utc::now(),
        }
    }

    fn state(id: &str, stage: u8, difficulty: f64, stability: f64) -> ObjectPropagationState {
        ObjectPropagationState {
            mastery_stage: stage,
            difficulty,
            stability,
            ..ObjectPropagationState::new(id, "lexical", Utc::now())
        }
    }

    fn edge(strength: f64, confidence: f64) -> TransferRelation {
        TransferRelation::new("a", "b", TransferType::Morphological, strength, confidence)
    }

    #[test]
    fn test_stage_weight_favours_later_advances() {
        let w = |prev, new| stage_weight(&event(prev, new, 1.0, UpdateType::Response));
        assert!(w(2, 3) > w(0, 1));
        assert!((w(2, 2) - MAINTENANCE_WEIGHT).abs() < EPSILON);
        assert!((w(3, 1) - MAINTENANCE_WEIGHT).abs() < EPSILON);
        assert!(w(0, 1) > MAINTENANCE_WEIGHT);
    }

    #[test]
    fn test_base_magnitude_values() {
        let config = PropagationConfig::default();
        let m = calculate_base_magnitude(&event(1, 2, 1.0, UpdateType::Response), &config);
        assert!((m - 0.8 * 0.8).abs() < EPSILON);

        let zero = calculate_base_magnitude(&event(2, 3, 0.0, UpdateType::Assessment), &config);
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn test_base_magnitude_monotone_in_accuracy() {
        let config = PropagationConfig::default();
        let mut last = -1.0;
        for i in 0..=20 {
            let acc = i as f64 / 20.0;
            let m = calculate_base_magnitude(&event(0, 1, acc, UpdateType::Review), &config);
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn test_base_magnitude_orders_update_types() {
        let config = PropagationConfig::default();
        let m = |t| calculate_base_magnitude(&event(1, 2, 0.9, t), &config);
        assert!(m(UpdateType::Assessment) > m(UpdateType::Response));
        assert!(m(UpdateType::Response) > m(UpdateType::Review));
        assert!(m(UpdateType::Review) > m(UpdateType::Initial));
        assert!(m(UpdateType::Initial) > m(UpdateType::Correction));
    }

    #[test]
    fn test_propagation_magnitude_decays_per_hop() {
        let config = PropagationConfig {
            max_depth: 3,
            ..PropagationConfig::default()
        };
        let e = edge(0.9, 0.9);
        let d1 = calculate_propagation_magnitude(0.7, &e, 1, &config);
        let d2 = calculate_propagation_magnitude(0.7, &e, 2, &config);
        let d3 = calculate_propagation_magnitude(0.7, &e, 3, &config);
        assert!(d1 > d2 && d2 > d3 && d3 > 0.0);
        assert!((d2 - d1 * 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_propagation_magnitude_beyond_depth_is_zero() {
        let config = PropagationConfig::default();
        assert_eq!(calculate_propagation_magnitude(1.0, &edge(1.0, 1.0), 3, &config), 0.0);
        assert_eq!(calculate_propagation_magnitude(1.0, &edge(1.0, 1.0), 0, &config), 0.0);
    }

    #[test]
    fn test_propagation_magnitude_sanitizes_edge() {
        let config = PropagationConfig::default();
        let m = calculate_propagation_magnitude(1.0, &edge(f64::NAN, 1.0), 1, &config);
        assert_eq!(m, 0.0);
        let m = calculate_propagation_magnitude(1.0, &edge(7.0, 1.0), 1, &config);
        assert!((m - 0.8).abs() < EPSILON);
    }

    #[test]
    fn test_difficulty_adjustment_halved_for_easier_target() {
        let source = state("a", 2, 1.0, 10.0);
        let harder = state("b", 1, 2.0, 0.0);
        let easier = state("c", 1, -1.0, 0.0);
        let full = calculate_difficulty_adjustment(0.4, &source, &harder);
        let damped = calculate_difficulty_adjustment(0.4, &source, &easier);
        assert!((full + 0.2).abs() < EPSILON);
        assert!((damped + 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_stability_boost_capped() {
        let stable = state("a", 4, 0.0, 365.0);
        assert!((calculate_stability_boost(1.0, &stable) - MAX_STABILITY_BOOST).abs() < EPSILON);
        let fresh = state("a", 0, 0.0, 30.0);
        assert!((calculate_stability_boost(0.5, &fresh) - 1.5).abs() < EPSILON);
        assert_eq!(calculate_stability_boost(0.5, &state("z", 0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_priority_frozen_for_mastered_target() {
        assert_eq!(calculate_priority_adjustment(0.9, &state("m", 3, 0.0, 0.0)), 0.0);
        let adj = calculate_priority_adjustment(0.5, &state("n", 1, 0.0, 0.0));
        assert!((adj + 0.15).abs() < EPSILON);
    }

    #[test]
    fn test_build_respects_field_flags() {
        let config = PropagationConfig {
            update_difficulty: false,
            update_priority: false,
            ..PropagationConfig::default()
        };
        let source = state("a", 2, 0.0, 30.0);
        let target = state("b", 1, 0.5, 0.0);
        let update = build_indirect_update(&source, &target, &edge(1.0, 0.9), 1, 0.8, &config);
        assert_eq!(update.difficulty_adjustment, 0.0);
        assert_eq!(update.priority_adjustment, 0.0);
        assert!(update.stability_boost > 0.0);
        assert_eq!(update.source_object_id, "a");
        assert_eq!(update.target_object_id, "b");
        assert!((update.confidence - 0.9).abs() < EPSILON);
        assert!(update.reason.contains("morphological"));
    }
}
