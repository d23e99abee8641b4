//! Commands
//!
//! Parsing and execution of the interactive command language:
//!
//! - **parser**: line → [`Command`] plus its [`OutputTarget`]
//! - **dispatcher**: runs commands against the store and the batch committer
//! - **format**: renders query results and listings
//! - **timing**: per-command durations shown by `\t`

mod dispatcher;
mod error;
mod format;
mod parser;
mod timing;

pub use dispatcher::{Dispatcher, SessionOptions, HELP};
pub use error::{DispatchError, ParseError, ParseResult};
pub use format::{format_timestamp, TableOptions};
pub use parser::{parse_command, parse_line, Command, CommandLine, OutputTarget};
pub use timing::Timing;
