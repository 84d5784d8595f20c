//! Error types for lead-trigger.

use std::time::Duration;

/// Top-level error type for the trigger.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Ledger persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tabular source errors (fetch and write-back).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Authentication failed for source {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response from {name}: {reason}")]
    InvalidResponse { name: String, reason: String },

    #[error("No writable columns for row {row}: {fields}")]
    MissingColumns { row: u64, fields: String },
}

/// Outbound messaging errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start transport: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

impl ChannelError {
    /// Transport-facing reason text, without the channel prefix.
    pub fn reason(&self) -> String {
        match self {
            Self::StartupFailed { reason, .. } | Self::SendFailed { reason, .. } => reason.clone(),
            Self::Timeout { timeout, .. } => format!("timed out after {timeout:?}"),
        }
    }
}

/// Pipeline-level errors. These are the fatal ones: everything at the
/// collaborator boundary is absorbed before it gets here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Ledger persistence failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type alias for the trigger.
pub type Result<T> = std::result::Result<T, Error>;
