//! Error types for the GC tuner

use vm_gc::GcError;

/// Tuner operation result type
pub type TunerResult<T> = Result<T, TunerError>;

/// Errors raised while configuring or installing a tuner
///
/// The feedback path itself never fails; these only come from the edges.
#[derive(Debug, thiserror::Error)]
pub enum TunerError {
    /// Invalid configuration
    #[error("Invalid tuner configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read tuner configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`TunerConfig`](crate::TunerConfig)
    #[error("Failed to parse tuner configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Collector host rejected the request
    #[error(transparent)]
    Gc(#[from] GcError),

    /// The tuner already has a cycle hook registered
    #[error("GC tuner is already installed")]
    AlreadyInstalled,
}

impl TunerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
