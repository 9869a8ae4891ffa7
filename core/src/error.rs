//! Error types for harness operations.
//!
//! Covers environment assignment, flag registration and parsing of
//! synthesized invocations, and fixture file I/O.

use thiserror::Error;

/// Errors that can occur while preparing a test environment or invocation.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// An environment variable could not be assigned.
    #[error("failed to set env {key} to {value}: {source}")]
    SetEnv {
        key: String,
        value: String,
        #[source]
        source: std::io::Error,
    },

    /// A flag name cannot be registered (empty, reserved, or malformed).
    #[error("invalid flag name {0:?}")]
    InvalidFlag(String),

    /// The synthesized argument list was rejected by the flag parser.
    #[error("failed to parse invocation: {0}")]
    ParseError(#[from] clap::Error),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`HarnessError`].
pub type Result<T> = std::result::Result<T, HarnessError>;
