//! Store client error types

use thiserror::Error;

/// Errors that can occur when talking to the store
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server could not be reached
    #[error("Store unavailable at {0}")]
    Unavailable(String),

    /// Request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Operation needs a database but none is selected
    #[error("No database selected (use \\db <name> and bind, or --db)")]
    NoDatabase,

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Result type alias for store client operations
pub type ClientResult<T> = Result<T, ClientError>;
