//! Error types for question routing, planning, discovery and lookup.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use thiserror::Error;

/// Error type for every fallible operation in the crate.
///
/// Most variants carry a message with enough context to be woven into a
/// natural-language answer, since the router surfaces many of them as
/// `Error: ...` text rather than as hard failures.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Language model call failed (transport, status or empty reply)
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Input classification failed
    #[error("Classification failed: {0}")]
    ClassificationError(String),

    /// Plan creation failed
    #[error("Planning failed: {0}")]
    PlanningError(String),

    /// Data lookup for an inference step failed
    #[error("Lookup failed: {0}")]
    LookupError(String),

    /// Schema payload could not be parsed into table facts
    #[error("Schema parse failed: {0}")]
    ParseError(String),

    /// Schema introspection failed
    #[error("Schema introspection failed: {0}")]
    IntrospectionError(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryError(String),

    /// Generated SQL attempted something other than a read
    #[error("Refusing to run non-read statement: {0}")]
    ReadOnlyViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client error (LLM APIs)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQL text could not be parsed
    #[error("SQL parse error: {0}")]
    SqlParseError(#[from] sqlparser::parser::ParserError),

    /// CSV rendering error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AgentError {
    /// Create an LLM error with context.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::LlmError(msg.into())
    }

    /// Create a query error with context.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a schema parse error with context.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Check if error is recoverable.
    ///
    /// # Returns
    ///
    /// `true` for transient capability failures that a retry or a later
    /// question might get past, `false` for malformed data and bad setup.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LlmError(_)
                | Self::ClassificationError(_)
                | Self::PlanningError(_)
                | Self::LookupError(_)
                | Self::QueryError(_)
                | Self::HttpError(_)
                | Self::IoError(_)
        )
    }
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgentError>;
