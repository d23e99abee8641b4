//! Command error types
//!
//! Parsing failures and everything that can go wrong while a command runs.

use thiserror::Error;

/// Errors raised while turning a line into a command
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    /// No rule matched the line
    #[error("Could not handle the command. type 'help' to get a help menu")]
    Unrecognized(String),

    /// Insert values are not a valid CSV record
    #[error("Could not parse values: {0}")]
    InvalidValues(String),

    /// Insert value count differs from the column count
    #[error("Number of values ({values}) must match number of columns ({}): Columns are: {columns:?}", columns.len())]
    ColumnMismatch { values: usize, columns: Vec<String> },

    /// An argument has the wrong shape (e.g. a non-numeric server id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("error: no command specified to pipe to")]
    MissingPipeCommand,

    #[error("error: no file specified to write to")]
    MissingRedirectTarget,
}

/// Result type for command parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while executing a command
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Client(#[from] crate::client::ClientError),

    #[error("Async insert failed: {0}")]
    Committer(#[from] crate::committer::CommitterError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not render result: {0}")]
    Render(#[from] serde_json::Error),

    /// Option needs an argument, e.g. `\db` without a name
    #[error("{0} argument must be set")]
    MissingArgument(&'static str),

    #[error("unrecognized option: {0}")]
    UnknownOption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mismatch_message() {
        let err = ParseError::ColumnMismatch {
            values: 2,
            columns: vec!["time".to_string(), "sequence_number".to_string(), "value".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"Number of values (2) must match number of columns (3): Columns are: ["time", "sequence_number", "value"]"#
        );
    }

    #[test]
    fn test_missing_argument_message() {
        let err = DispatchError::MissingArgument("database");
        assert_eq!(err.to_string(), "database argument must be set");
    }
}
