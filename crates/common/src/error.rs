//! Error types shared across FIP crates.

use std::path::PathBuf;

/// Top-level error type for FIP operations.
#[derive(Debug, thiserror::Error)]
pub enum FipError {
    /// Bad or missing reduction operator, malformed region, or any other
    /// setting that cannot be acted on.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Frame or record shape that does not match what the stage expects.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FipError.
pub type FipResult<T> = Result<T, FipError>;

impl FipError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Whether the error stems from configuration rather than data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Whether the error stems from the data flowing through a stage.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
