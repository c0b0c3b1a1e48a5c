//! Common Types and Constants
//!
//! Shared data structures for the propagation pipeline: learning events,
//! transfer relations, per-object state, indirect updates and run results.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PropagationError;

// ==================== Constants ====================

/// Hard ceiling on BFS hops, regardless of `PropagationConfig::max_depth`
pub const MAX_PROPAGATION_DEPTH: u32 = 3;

/// Hard ceiling on indirect updates produced by a single run
pub const MAX_PROPAGATION_TARGETS: usize = 50;

/// Default capacity of the audit log
pub const MAX_UPDATE_HISTORY: usize = 1000;

/// Highest mastery stage (fluent)
pub const MAX_MASTERY_STAGE: u8 = 4;

/// Stage at which an object counts as mastered for priority purposes
pub const MASTERED_STAGE: u8 = 3;

pub const MIN_DIFFICULTY: f64 = -3.0;
pub const MAX_DIFFICULTY: f64 = 3.0;

/// Stability range in days
pub const MIN_STABILITY: f64 = 0.0;
pub const MAX_STABILITY: f64 = 365.0;

pub const MIN_PRIORITY: f64 = 0.0;
pub const MAX_PRIORITY: f64 = 1.0;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Enums ====================

/// Kind of learning event that produced a direct state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Response,
    Review,
    Assessment,
    Initial,
    Correction,
}

impl UpdateType {
    pub const ALL: [UpdateType; 5] = [
        Self::Response,
        Self::Review,
        Self::Assessment,
        Self::Initial,
        Self::Correction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Review => "review",
            Self::Assessment => "assessment",
            Self::Initial => "initial",
            Self::Correction => "correction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "response" => Some(Self::Response),
            "review" => Some(Self::Review),
            "assessment" => Some(Self::Assessment),
            "initial" => Some(Self::Initial),
            "correction" => Some(Self::Correction),
            _ => None,
        }
    }
}

/// Relationship carried by a transfer edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Morphological,
    Collocational,
    Semantic,
    Syntactic,
    Phonological,
    Orthographic,
}

impl TransferType {
    pub const ALL: [TransferType; 6] = [
        Self::Morphological,
        Self::Collocational,
        Self::Semantic,
        Self::Syntactic,
        Self::Phonological,
        Self::Orthographic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morphological => "morphological",
            Self::Collocational => "collocational",
            Self::Semantic => "semantic",
            Self::Syntactic => "syntactic",
            Self::Phonological => "phonological",
            Self::Orthographic => "orthographic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "morphological" => Some(Self::Morphological),
            "collocational" => Some(Self::Collocational),
            "semantic" => Some(Self::Semantic),
            "syntactic" => Some(Self::Syntactic),
            "phonological" => Some(Self::Phonological),
            "orthographic" => Some(Self::Orthographic),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Events & Relations ====================

/// A direct learning signal for one object, produced by response scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectUpdateEvent {
    pub source_object_id: String,
    pub update_type: UpdateType,
    pub previous_stage: u8,
    pub new_stage: u8,
    /// Accuracy [0, 1]
    pub accuracy: f64,
    pub response_time_ms: u64,
    pub component: String,
    pub timestamp: DateTime<Utc>,
}

impl ObjectUpdateEvent {
    /// Validated constructor for callers that build events from raw input.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_object_id: impl Into<String>,
        update_type: UpdateType,
        previous_stage: u8,
        new_stage: u8,
        accuracy: f64,
        response_time_ms: u64,
        component: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PropagationError> {
        let source_object_id = source_object_id.into();
        if source_object_id.is_empty() {
            return Err(PropagationError::InvalidEvent(
                "sourceObjectId must not be empty".to_string(),
            ));
        }
        if previous_stage > MAX_MASTERY_STAGE || new_stage > MAX_MASTERY_STAGE {
            return Err(PropagationError::InvalidEvent(format!(
                "stage out of range: {previous_stage} -> {new_stage} (max {MAX_MASTERY_STAGE})"
            )));
        }
        if !accuracy.is_finite() || !(0.0..=1.0).contains(&accuracy) {
            return Err(PropagationError::InvalidEvent(format!(
                "accuracy must be within [0, 1], got {accuracy}"
            )));
        }
        if response_time_ms == 0 {
            return Err(PropagationError::InvalidEvent(
                "responseTimeMs must be positive".to_string(),
            ));
        }

        Ok(Self {
            source_object_id,
            update_type,
            previous_stage,
            new_stage,
            accuracy,
            response_time_ms,
            component: component.into(),
            timestamp,
        })
    }

    /// Whether the event moved the object to a higher stage
    pub fn is_stage_advance(&self) -> bool {
        self.new_stage > self.previous_stage
    }
}

/// Directed, typed, weighted edge asserting partial transfer of mastery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRelation {
    pub source_id: String,
    pub target_id: String,
    pub transfer_type: TransferType,
    /// Strength [0, 1]
    pub strength: f64,
    /// Confidence [0, 1]
    pub confidence: f64,
}

impl TransferRelation {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        transfer_type: TransferType,
        strength: f64,
        confidence: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            transfer_type,
            strength,
            confidence,
        }
    }
}

// ==================== Object State ====================

/// Propagation-relevant slice of an object's learning state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPropagationState {
    pub object_id: String,
    pub mastery_stage: u8,
    /// Difficulty [-3, 3]
    pub difficulty: f64,
    /// Stability in days [0, 365]
    pub stability: f64,
    /// Scheduling priority [0, 1]
    pub priority: f64,
    pub component: String,
    pub last_updated: DateTime<Utc>,
}

impl ObjectPropagationState {
    /// Neutral record for an object seen for the first time
    pub fn new(object_id: impl Into<String>, component: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            object_id: object_id.into(),
            mastery_stage: 0,
            difficulty: 0.0,
            stability: 0.0,
            priority: 0.5,
            component: component.into(),
            last_updated: now,
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.mastery_stage >= MASTERED_STAGE
    }
}

/// Object state store keyed by object id
pub type ObjectStates = HashMap<String, ObjectPropagationState>;

// ==================== Propagation Output ====================

/// One secondary state adjustment derived from a learning event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectUpdate {
    pub target_object_id: String,
    /// Object whose outgoing edge produced this update
    pub source_object_id: String,
    pub relationship_type: TransferType,
    /// Magnitude [0, 1]
    pub magnitude: f64,
    pub difficulty_adjustment: f64,
    /// Days, >= 0
    pub stability_boost: f64,
    /// [-1, 1]
    pub priority_adjustment: f64,
    /// [0, 1]
    pub confidence: f64,
    /// Hops from the event source, >= 1
    pub depth: u32,
    pub reason: String,
}

/// Aggregate of one propagation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationResult {
    pub source_object_id: String,
    pub updates: Vec<IndirectUpdate>,
    pub total_affected: usize,
    pub total_magnitude: f64,
    pub by_relationship_type: BTreeMap<TransferType, f64>,
    pub processing_time_ms: f64,
    /// Set when `MAX_PROPAGATION_TARGETS` stopped collection early
    pub truncated: bool,
}

impl PropagationResult {
    /// Result of a run that was rejected up front
    pub fn empty(source_object_id: impl Into<String>) -> Self {
        Self {
            source_object_id: source_object_id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Append-only audit record of an applied update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub source_object_id: String,
    pub target_object_id: String,
    pub magnitude: f64,
    pub relationship_type: TransferType,
}
