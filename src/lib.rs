//! # danci-propagation - indirect learning-state updates
//!
//! When a learner's response changes the mastery state of one language
//! object (word, morpheme, sound, structure), part of that change leaks to
//! related objects without re-testing them. This crate computes and applies
//! those secondary adjustments.
//!
//! ## Pipeline
//!
//! 1. [`magnitude`] - base magnitude of the event, per-edge attenuation
//! 2. [`propagator`] - bounded BFS over the transfer-relation graph
//! 3. [`aggregator`] - diminishing-returns merge of updates sharing a target
//! 4. [`applier`] - clamped writes into the object state store
//! 5. [`history`] - bounded audit log and run summaries
//!
//! [`engine::PropagationEngine`] wires the stages together; [`config`],
//! [`sanitize`], [`error`] and [`logging`] carry the ambient concerns.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use danci_propagation::{
//!     ObjectPropagationState, ObjectStates, ObjectUpdateEvent, PropagationEngine,
//!     TransferRelation, TransferType, UpdateType,
//! };
//!
//! let now = Utc::now();
//! let mut states = ObjectStates::new();
//! for id in ["happy", "unhappy"] {
//!     states.insert(id.to_string(), ObjectPropagationState::new(id, "lexical", now));
//! }
//! let relations = vec![TransferRelation::new(
//!     "happy", "unhappy", TransferType::Morphological, 0.9, 0.95,
//! )];
//! let event = ObjectUpdateEvent::new("happy", UpdateType::Response, 1, 2, 1.0, 1800, "lexical", now)
//!     .expect("valid event");
//!
//! let engine = PropagationEngine::with_defaults();
//! let out = engine.propagate_and_apply(&event, &relations, &mut states, true);
//! assert_eq!(out.applied, 1);
//! assert!(states["unhappy"].difficulty < 0.0);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aggregator;
pub mod applier;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod magnitude;
pub mod propagator;
pub mod sanitize;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use aggregator::{aggregate_by_target, aggregate_updates};
pub use applier::{apply_indirect_updates, SharedObjectStates};
pub use config::{PropagationConfig, RelationshipWeights, UpdateTypeWeights};
pub use engine::{AppliedPropagation, PropagationEngine};
pub use error::PropagationError;
pub use history::{create_history_entries, summarize_propagation, UpdateHistory};
pub use magnitude::{calculate_base_magnitude, calculate_propagation_magnitude};
pub use propagator::{propagate_update, RelationIndex};
