//! Error types for the fuzzy dictionary.

use thiserror::Error;

/// Boxed error returned by caller-supplied strategies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for dictionary operations.
pub type Result<T> = std::result::Result<T, FuzzyError>;

/// Errors that can occur while configuring, filling, querying or persisting
/// a [`FuzzyMap`](crate::FuzzyMap).
#[derive(Debug, Error)]
pub enum FuzzyError {
    /// No key lies within the correction budget of the query.
    #[error("no key within correction budget for query {query:?}")]
    NoMatch { query: String },

    /// A price, probability, distance or budget is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Keys must contain at least one character.
    #[error("key must not be empty")]
    EmptyKey,

    /// The merge strategy rejected the incoming value.
    #[error("merge function failed: {0}")]
    MergeFailure(#[source] BoxError),

    /// A snapshot blob could not be decoded or is structurally inconsistent.
    #[error("corrupt snapshot: {0}")]
    SnapshotCorrupt(String),

    /// A value could not be written into a snapshot.
    #[error("snapshot encoding failed: {0}")]
    SnapshotEncode(#[source] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A JSON configuration document could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl FuzzyError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FuzzyError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        FuzzyError::SnapshotCorrupt(msg.into())
    }
}
