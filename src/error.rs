/// Errors raised at construction boundaries (config and event creation).
///
/// The propagation run itself never fails: invalid numbers are clamped or
/// treated as zero-effect instead.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("invalid value for {key}: {value}")]
    EnvVar { key: String, value: String },
}
