// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tenet memory engine.

use thiserror::Error;

/// The primary error type used across all Tenet adapter traits and core operations.
///
/// Malformed model output has no variant: it is a degraded-but-valid result
/// handled where the output is parsed, never an error.
#[derive(Debug, Error)]
pub enum TenetError {
    /// Configuration errors (invalid TOML, missing required fields, out-of-range thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat or embedding provider errors (API failure, malformed transport payload).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A model call exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// An operation referenced an entity that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TenetError {
    /// Shorthand for a provider failure without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        TenetError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// True for failures of an external model capability (provider error or timeout).
    ///
    /// These are the errors every model-calling stage recovers from locally.
    pub fn is_transient(&self) -> bool {
        matches!(self, TenetError::Provider { .. } | TenetError::Timeout { .. })
    }
}
