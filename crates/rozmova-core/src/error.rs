//! Error types for the Rozmova application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Rozmova application.
///
/// This provides typed, structured error variants with constructor helpers,
/// so upstream failures surface as values rather than panics.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RozmovaError {
    /// Completion service (LLM) call failed.
    #[error("Completion service error: {0}")]
    Completion(String),

    /// Voice codec (transcription/synthesis) call failed.
    #[error("Voice codec error: {0}")]
    Voice(String),

    /// Messaging gateway delivery or polling failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Configuration error (missing tokens, bad paths).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RozmovaError {
    /// Creates a Completion error.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    /// Creates a Voice error.
    pub fn voice(message: impl Into<String>) -> Self {
        Self::Voice(message.into())
    }

    /// Creates a Gateway error.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Convenience result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, RozmovaError>;
