//! Error types for osint-relay.

use std::time::Duration;

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

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

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Message-source and publish-target errors.
///
/// `Display`/`Error` are implemented by hand because thiserror's derive
/// unconditionally treats a field named `source` as the error source, and
/// these `source` fields are plain strings naming the message source.
#[derive(Debug)]
pub enum ChannelError {
    FetchFailed { source: String, reason: String },

    MediaDownload { source: String, reason: String },

    PublishFailed { target: String, reason: String },
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed { source, reason } => {
                write!(f, "Fetch from {source} failed: {reason}")
            }
            Self::MediaDownload { source, reason } => {
                write!(f, "Media download failed for {source}: {reason}")
            }
            Self::PublishFailed { target, reason } => {
                write!(f, "Publish to {target} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ChannelError {}

/// External classification-service errors.
///
/// Every variant is treated as "not relevant" by the pipeline (fail-closed);
/// the distinction only matters for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    /// Whether a retry could plausibly succeed. Malformed responses are
    /// not retried; the same prompt would produce the same failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::Timeout(_))
    }
}

/// Pipeline-level errors.
///
/// Implemented by hand for the same reason as [`ChannelError`]: the
/// `Message` variant's `source` field is a plain string, which thiserror's
/// derive would wrongly treat as the error source.
#[derive(Debug)]
pub enum PipelineError {
    Store(DatabaseError),

    Channel(ChannelError),

    Message {
        source: String,
        message_id: i64,
        reason: String,
    },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "Store operation failed: {err}"),
            Self::Channel(err) => write!(f, "Channel operation failed: {err}"),
            Self::Message {
                source,
                message_id,
                reason,
            } => write!(
                f,
                "Message processing failed for {source} message {message_id}: {reason}"
            ),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Channel(err) => Some(err),
            Self::Message { .. } => None,
        }
    }
}

impl From<DatabaseError> for PipelineError {
    fn from(err: DatabaseError) -> Self {
        Self::Store(err)
    }
}

impl From<ChannelError> for PipelineError {
    fn from(err: ChannelError) -> Self {
        Self::Channel(err)
    }
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
