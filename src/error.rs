//! Error handling for the GrãoSeguro simulator crate.
//!
//! The series engine itself never fails: out-of-range inputs are normalized.
//! These errors only surface at the edges (configuration files, category
//! parsing, runtime setup).

/// A specialized `Result` type for simulator operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// The main error type for simulator operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An AQI category label was not recognized
    #[error("Unknown AQI category: {0}")]
    UnknownCategory(String),

    /// The player was used outside of a tokio runtime
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl SimulationError {
    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new unknown-category error
    pub fn unknown_category(label: impl Into<String>) -> Self {
        Self::UnknownCategory(label.into())
    }

    /// Create a new runtime error
    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
