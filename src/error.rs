use thiserror::Error;

/// Errors raised while building or restoring a mechanism.
///
/// Event-level outcomes (fictitious events, failed selections) are not errors;
/// they are reported through [`crate::process::PerformStatus`].
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("species '{0}' is not part of the gas-phase mechanism")]
    UnknownSpecies(String),
    #[error("particle component '{0}' is not defined")]
    UnknownComponent(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed process record: {0}")]
    Record(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
