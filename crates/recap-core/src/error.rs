// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recap summary worker.

use thiserror::Error;

/// The primary error type shared by every Recap crate.
#[derive(Debug, Error)]
pub enum RecapError {
    /// Missing or invalid configuration. Fatal before processing starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Store I/O failure (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reply delivery failure.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-generation backend failure.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed queue payload or transport failure.
    #[error("queue error: {0}")]
    Queue(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecapError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RecapError::Storage {
            source: Box::new(err),
        }
    }

    /// A provider failure with a message and no underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        RecapError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// A channel failure with a message and no underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        RecapError::Channel {
            message: message.into(),
            source: None,
        }
    }
}
