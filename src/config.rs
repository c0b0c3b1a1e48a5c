use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PropagationError;
use crate::types::{TransferType, UpdateType};

/// Transfer weight per relationship type.
///
/// One field per [`TransferType`] variant; lookups go through an exhaustive
/// match so a new variant cannot be added without a weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipWeights {
    pub morphological: f64,
    pub collocational: f64,
    pub semantic: f64,
    pub syntactic: f64,
    pub phonological: f64,
    pub orthographic: f64,
}

impl Default for RelationshipWeights {
    fn default() -> Self {
        Self {
            morphological: 0.8,
            collocational: 0.6,
            semantic: 0.5,
            syntactic: 0.5,
            phonological: 0.4,
            orthographic: 0.3,
        }
    }
}

impl RelationshipWeights {
    pub fn get(&self, transfer_type: TransferType) -> f64 {
        match transfer_type {
            TransferType::Morphological => self.morphological,
            TransferType::Collocational => self.collocational,
            TransferType::Semantic => self.semantic,
            TransferType::Syntactic => self.syntactic,
            TransferType::Phonological => self.phonological,
            TransferType::Orthographic => self.orthographic,
        }
    }

    pub fn set(&mut self, transfer_type: TransferType, weight: f64) {
        let slot = match transfer_type {
            TransferType::Morphological => &mut self.morphological,
            TransferType::Collocational => &mut self.collocational,
            TransferType::Semantic => &mut self.semantic,
            TransferType::Syntactic => &mut self.syntactic,
            TransferType::Phonological => &mut self.phonological,
            TransferType::Orthographic => &mut self.orthographic,
        };
        *slot = weight;
    }
}

/// Base-magnitude multiplier per update type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTypeWeights {
    pub assessment: f64,
    pub response: f64,
    pub review: f64,
    pub initial: f64,
    pub correction: f64,
}

impl Default for UpdateTypeWeights {
    fn default() -> Self {
        Self {
            assessment: 1.0,
            response: 0.8,
            review: 0.6,
            initial: 0.4,
            correction: 0.3,
        }
    }
}

impl UpdateTypeWeights {
    pub fn get(&self, update_type: UpdateType) -> f64 {
        match update_type {
            UpdateType::Assessment => self.assessment,
            UpdateType::Response => self.response,
            UpdateType::Review => self.review,
            UpdateType::Initial => self.initial,
            UpdateType::Correction => self.correction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationConfig {
    pub enabled: bool,
    /// Updates below this magnitude are dropped and not expanded further
    pub min_magnitude: f64,
    /// Requested hop limit, further capped by `MAX_PROPAGATION_DEPTH`
    pub max_depth: u32,
    /// Geometric attenuation per additional hop, (0, 1]
    pub depth_decay_factor: f64,
    pub relationship_weights: RelationshipWeights,
    pub update_type_weights: UpdateTypeWeights,
    pub update_difficulty: bool,
    pub update_stability: bool,
    pub update_priority: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_magnitude: 0.05,
            max_depth: 2,
            depth_decay_factor: 0.5,
            relationship_weights: RelationshipWeights::default(),
            update_type_weights: UpdateTypeWeights::default(),
            update_difficulty: true,
            update_stability: true,
            update_priority: true,
        }
    }
}

impl PropagationConfig {
    /// Disabled config, every run returns an empty result
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `PROPAGATION_*` environment variables.
    pub fn from_env() -> Result<Self, PropagationError> {
        let mut config = Self::default();

        if let Some(val) = env_override("PROPAGATION_ENABLED")? {
            config.enabled = val;
        }
        if let Some(val) = env_override("PROPAGATION_MIN_MAGNITUDE")? {
            config.min_magnitude = val;
        }
        if let Some(val) = env_override("PROPAGATION_MAX_DEPTH")? {
            config.max_depth = val;
        }
        if let Some(val) = env_override("PROPAGATION_DECAY_FACTOR")? {
            config.depth_decay_factor = val;
        }
        if let Some(val) = env_override("PROPAGATION_UPDATE_DIFFICULTY")? {
            config.update_difficulty = val;
        }
        if let Some(val) = env_override("PROPAGATION_UPDATE_STABILITY")? {
            config.update_stability = val;
        }
        if let Some(val) = env_override("PROPAGATION_UPDATE_PRIORITY")? {
            config.update_priority = val;
        }
        for transfer_type in TransferType::ALL {
            let key = relationship_weight_key(transfer_type);
            if let Some(val) = env_override(&key)? {
                config.relationship_weights.set(transfer_type, val);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PropagationError> {
        if !self.min_magnitude.is_finite() || !(0.0..=1.0).contains(&self.min_magnitude) {
            return Err(PropagationError::InvalidConfig(format!(
                "minMagnitude must be within [0, 1], got {}",
                self.min_magnitude
            )));
        }
        if self.max_depth == 0 {
            return Err(PropagationError::InvalidConfig(
                "maxDepth must be at least 1".to_string(),
            ));
        }
        if !self.depth_decay_factor.is_finite()
            || self.depth_decay_factor <= 0.0
            || self.depth_decay_factor > 1.0
        {
            return Err(PropagationError::InvalidConfig(format!(
                "depthDecayFactor must be within (0, 1], got {}",
                self.depth_decay_factor
            )));
        }
        for transfer_type in TransferType::ALL {
            check_weight(transfer_type.as_str(), self.relationship_weights.get(transfer_type))?;
        }
        for update_type in UpdateType::ALL {
            check_weight(update_type.as_str(), self.update_type_weights.get(update_type))?;
        }
        Ok(())
    }
}

/// e.g. `PROPAGATION_WEIGHT_MORPHOLOGICAL`
fn relationship_weight_key(transfer_type: TransferType) -> String {
    format!("PROPAGATION_WEIGHT_{}", transfer_type.as_str().to_ascii_uppercase())
}

fn check_weight(name: &str, weight: f64) -> Result<(), PropagationError> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(PropagationError::InvalidConfig(format!(
            "weight for {name} must be within [0, 1], got {weight}"
        )))
    }
}

fn env_override<T: FromStr>(key: &str) -> Result<Option<T>, PropagationError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| {
                tracing::warn!(key, value = %raw, "Failed to parse propagation override");
                PropagationError::EnvVar {
                    key: key.to_string(),
                    value: raw,
                }
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PropagationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enabled);
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_update_type_ordering() {
        let w = UpdateTypeWeights::default();
        assert!(w.assessment > w.response);
        assert!(w.response > w.review);
        assert!(w.review > w.initial);
        assert!(w.initial > w.correction);
    }

    #[test]
    fn test_relationship_weight_set_get() {
        let mut w = RelationshipWeights::default();
        assert!((w.get(TransferType::Morphological) - 0.8).abs() < 1e-12);
        w.set(TransferType::Orthographic, 0.9);
        assert!((w.get(TransferType::Orthographic) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PropagationConfig {
            depth_decay_factor: 0.0,
            ..PropagationConfig::default()
        };
        assert!(config.validate().is_err());

        config.depth_decay_factor = 0.5;
        config.min_magnitude = 1.5;
        assert!(config.validate().is_err());

        config.min_magnitude = 0.1;
        config.max_depth = 0;
        assert!(config.validate().is_err());

        config.max_depth = 2;
        config.relationship_weights.semantic = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(PropagationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disabled() {
        let config = PropagationConfig::disabled();
        assert!(!config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_reads_relationship_weight() {
        let key = relationship_weight_key(TransferType::Phonological);
        assert_eq!(key, "PROPAGATION_WEIGHT_PHONOLOGICAL");

        std::env::set_var(&key, "0.7");
        let config = PropagationConfig::from_env().expect("valid override");
        std::env::remove_var(&key);

        assert!((config.relationship_weights.get(TransferType::Phonological) - 0.7).abs() < 1e-12);
        assert!((config.relationship_weights.get(TransferType::Semantic) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_env_override_parse_error() {
        std::env::set_var("PROPAGATION_TEST_ONLY_DEPTH", "deep");
        let result: Result<Option<u32>, _> = env_override("PROPAGATION_TEST_ONLY_DEPTH");
        assert!(matches!(result, Err(PropagationError::EnvVar { .. })));
        std::env::remove_var("PROPAGATION_TEST_ONLY_DEPTH");

        let missing: Option<u32> =
            env_override("PROPAGATION_TEST_ONLY_MISSING").expect("missing is not an error");
        assert!(missing.is_none());
    }
}
