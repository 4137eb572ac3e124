//! Error types for the Book Info Agent
//!
//! Transport failures are typed and propagated to the transaction loop;
//! parse failures never leave the parser's best-effort path.

use thiserror::Error;
use txn_span::SinkError;

/// Failure while talking to the content service
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be built (bad URL, bad header)
    #[error("Failed to build request: {0}")]
    Request(String),

    /// The request could not be sent or no response arrived
    #[error("Failed to send request: {0}")]
    Send(#[source] reqwest::Error),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// A document that could not be decoded at all
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<quick_xml::DeError> for ParseError {
    fn from(err: quick_xml::DeError) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// Invalid agent configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Main error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AgentError {
    /// Whether the error came from a dependency call rather than setup.
    pub fn is_transport(&self) -> bool {
        matches!(self, AgentError::Fetch(_))
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
