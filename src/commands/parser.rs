//! Command Parser
//!
//! Turns one input line into a [`CommandLine`]: the command itself plus where
//! its output should go.
//!
//! # Supported Syntax
//!
//! ```text
//! bind | conn | ping | writerc | help | commands
//! create admin <name> <password>      update admin <name> <password>
//! create db <name>                    delete db <name>
//! delete admin <name>                 delete server <id>
//! drop series <name>                  echo <text>
//! insert into <series> [(<col>, ...)] values (<v>, ...)
//! list admin | db | series [...] | servers | shardspaces
//! raw <query>                         select ...
//! \async | \dt | \r | \t | \db <name> | \user <name> | \pass <password>
//! ```
//!
//! Any line may end with `;| <program> [args]` to pipe output into a program
//! or `;> <file>` to write output to a file.

use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

use super::error::{ParseError, ParseResult};
use crate::series::{Series, Value, DEFAULT_COLUMNS};

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Re-connect with the pending user/password/database settings
    Bind,
    /// Show the connection settings in use
    Conn,
    CreateAdmin { name: String, password: String },
    CreateDb(String),
    DeleteAdmin(String),
    DeleteDb(String),
    DeleteServer(i64),
    /// Full `drop series ...` statement, sent as a query
    DropSeries(String),
    Echo(String),
    Insert(Series),
    ListAdmin,
    ListDb,
    /// Full `list series ...` statement, sent as a query
    ListSeries(String),
    ListServers,
    ListShardSpaces,
    /// A backslash option such as `\async` or `\db metrics`
    SetOption { name: String, arg: Option<String> },
    Ping,
    /// Query whose response is dumped as JSON
    Raw(String),
    Select(String),
    UpdateAdmin { name: String, password: String },
    WriteRc,
    Help,
}

/// Where a command's output is written
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Stdout,
    /// Spawn a program and feed the output to its stdin
    Pipe { program: String, args: Vec<String> },
    /// Create (or truncate) a file
    File(PathBuf),
}

/// A command together with its output target
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub command: Command,
    pub target: OutputTarget,
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Bind,
    Conn,
    CreateAdmin,
    CreateDb,
    DeleteAdmin,
    DeleteDb,
    DeleteServer,
    DropSeries,
    Echo,
    Insert,
    InsertQuoted,
    ListAdmin,
    ListDb,
    ListSeries,
    ListServers,
    ListShardSpaces,
    SetOption,
    Ping,
    Raw,
    Select,
    UpdateAdmin,
    WriteRc,
    Help,
}

/// Command grammar, checked in order; the first match wins
static RULES: LazyLock<Vec<(Rule, Regex)>> = LazyLock::new(|| {
    [
        (Rule::Bind, r"^bind$"),
        (Rule::Conn, r"^conn$"),
        (Rule::CreateAdmin, r"^create admin ([a-zA-Z0-9_-]+) (.+)$"),
        (Rule::CreateDb, r"^create db ([a-zA-Z0-9_-]+)$"),
        (Rule::DeleteAdmin, r"^delete admin ([a-zA-Z0-9_-]+)$"),
        (Rule::DeleteDb, r"^delete db ([a-zA-Z0-9_-]+)$"),
        (Rule::DeleteServer, r"^delete server (.+)$"),
        (Rule::DropSeries, r"^drop series .+$"),
        (Rule::Echo, r"^echo (.+)$"),
        (
            Rule::Insert,
            r"^insert into ([a-zA-Z0-9_-]+) ?(\(.+\))? values \((.*)\)$",
        ),
        (
            Rule::InsertQuoted,
            r#"^insert into "(.+)" ?(\(.+\))? values \((.*)\)$"#,
        ),
        (Rule::ListAdmin, r"^list admin$"),
        (Rule::ListDb, r"^list db$"),
        (Rule::ListSeries, r"^list series.*$"),
        (Rule::ListServers, r"^list servers$"),
        (Rule::ListShardSpaces, r"^list shardspaces$"),
        (Rule::SetOption, r"^\\([a-z]+)(?: +(\S+))?\s*$"),
        (Rule::Ping, r"^ping$"),
        (Rule::Raw, r"^raw (.+)$"),
        (Rule::Select, r"^select .*$"),
        (Rule::UpdateAdmin, r"^update admin ([a-zA-Z0-9_-]+) (.+)$"),
        (Rule::WriteRc, r"^writerc$"),
        (Rule::Help, r"^(help|commands)$"),
    ]
    .into_iter()
    .map(|(rule, pattern)| (rule, Regex::new(pattern).expect("command pattern is valid")))
    .collect()
});

/// Parse a full input line, including any `;|` or `;>` suffix
pub fn parse_line(line: &str) -> ParseResult<CommandLine> {
    let (statement, target) = split_target(line.trim())?;
    let command = parse_command(statement)?;
    Ok(CommandLine { command, target })
}

/// Parse a bare command with no output modifier
pub fn parse_command(statement: &str) -> ParseResult<Command> {
    let statement = statement.trim();

    for (rule, regex) in RULES.iter() {
        if let Some(caps) = regex.captures(statement) {
            return build(*rule, statement, &caps);
        }
    }

    Err(ParseError::Unrecognized(statement.to_string()))
}

fn split_target(line: &str) -> ParseResult<(&str, OutputTarget)> {
    // "; |" and "; >" are accepted as spellings of ";|" and ";>"
    if let Some((statement, rest)) = split_modifier(line, '|') {
        let mut words = rest.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(ParseError::MissingPipeCommand)?;
        let args = words.collect();
        return Ok((statement, OutputTarget::Pipe { program, args }));
    }

    if let Some((statement, rest)) = split_modifier(line, '>') {
        let file = rest.trim();
        if file.is_empty() {
            return Err(ParseError::MissingRedirectTarget);
        }
        return Ok((statement, OutputTarget::File(PathBuf::from(file))));
    }

    Ok((line.strip_suffix(';').unwrap_or(line).trim_end(), OutputTarget::Stdout))
}

/// Split at the first `;<marker>` (or `; <marker>`)
fn split_modifier(line: &str, marker: char) -> Option<(&str, &str)> {
    let tight = format!(";{marker}");
    let spaced = format!("; {marker}");

    let (at, len) = match (line.find(&tight), line.find(&spaced)) {
        (Some(a), Some(b)) if b < a => (b, spaced.len()),
        (Some(a), _) => (a, tight.len()),
        (None, Some(b)) => (b, spaced.len()),
        (None, None) => return None,
    };

    Some((line[..at].trim_end(), &line[at + len..]))
}

fn build(rule: Rule, statement: &str, caps: &Captures<'_>) -> ParseResult<Command> {
    let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

    let command = match rule {
        Rule::Bind => Command::Bind,
        Rule::Conn => Command::Conn,
        Rule::CreateAdmin => Command::CreateAdmin {
            name: group(1),
            password: group(2),
        },
        Rule::CreateDb => Command::CreateDb(group(1)),
        Rule::DeleteAdmin => Command::DeleteAdmin(group(1)),
        Rule::DeleteDb => Command::DeleteDb(group(1)),
        Rule::DeleteServer => {
            let raw = group(1);
            let id = raw
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidArgument(format!("server id '{}'", raw.trim())))?;
            Command::DeleteServer(id)
        }
        Rule::DropSeries => Command::DropSeries(statement.to_string()),
        Rule::Echo => Command::Echo(group(1)),
        Rule::Insert | Rule::InsertQuoted => Command::Insert(parse_insert(
            &group(1),
            caps.get(2).map(|m| m.as_str()),
            &group(3),
        )?),
        Rule::ListAdmin => Command::ListAdmin,
        Rule::ListDb => Command::ListDb,
        Rule::ListSeries => Command::ListSeries(statement.to_string()),
        Rule::ListServers => Command::ListServers,
        Rule::ListShardSpaces => Command::ListShardSpaces,
        Rule::SetOption => Command::SetOption {
            name: group(1),
            arg: caps.get(2).map(|m| m.as_str().to_string()),
        },
        Rule::Ping => Command::Ping,
        Rule::Raw => Command::Raw(group(1)),
        Rule::Select => Command::Select(statement.to_string()),
        Rule::UpdateAdmin => Command::UpdateAdmin {
            name: group(1),
            password: group(2),
        },
        Rule::WriteRc => Command::WriteRc,
        Rule::Help => Command::Help,
    };

    Ok(command)
}

/// Build a single-point series from the pieces of an insert statement
///
/// Without a column list the default `time, sequence_number, value` columns
/// are used, so the value count must match those.
fn parse_insert(name: &str, columns: Option<&str>, values: &str) -> ParseResult<Series> {
    let columns: Vec<String> = match columns {
        Some(list) => list
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .map(|c| c.trim().to_string())
            .collect(),
        None => DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(values.as_bytes());

    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => return Err(ParseError::InvalidValues(e.to_string())),
        None => return Err(ParseError::InvalidValues("no values given".to_string())),
    };

    if record.len() != columns.len() {
        return Err(ParseError::ColumnMismatch {
            values: record.len(),
            columns,
        });
    }

    let point = record.iter().map(Value::parse).collect();
    Ok(Series::new(name, columns).point(point))
}
