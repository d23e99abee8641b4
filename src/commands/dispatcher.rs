//! Command Dispatcher
//!
//! Executes parsed commands against the store. Inserts go straight to the
//! store, or through the batch committer while async mode is on. The
//! dispatcher also owns the session switches (`\async`, `\dt`, `\r`, `\t`)
//! and the pending credentials that `bind` applies.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::error::DispatchError;
use super::format::{self, TableOptions};
use super::parser::{parse_line, Command, OutputTarget};
use super::timing::Timing;
use crate::client::StoreClient;
use crate::committer::{Committer, DrainOutcome};
use crate::config::{Config, ConfigError};

pub const HELP: &str = r#"
influx-cli commands
-------------------

administration
--------------

create admin <user> <pass>      : add given admin user
delete admin <user>             : delete admin user
update admin <user> <pass>      : update the password for given admin user
list admin                      : list admins

create db <name>                : create database
delete db <name>                : drop database
list db                         : list databases

list series [/regex/[i]]        : list series, optionally filtered by regex
drop series <name>              : drop series by given name

delete server <id>              : delete server by id
list servers                    : list servers

list shardspaces                : list shardspaces

options & current session
-------------------------

\async           : toggle asynchronous inserts (flushes pending inserts when turned off)
\dt              : toggle printing of timestamps as datetimes
\r               : toggle records-only output (no series names or column headers)
\t               : toggle timing display
\db <db>         : database to use on the next bind
\user <user>     : user to use on the next bind
\pass <pass>     : password to use on the next bind
bind             : reconnect using the current db/user/pass
ping             : ping the server

data i/o
--------

insert into <name> [(col1[,col2[...]])] values (val1[,val2[,val3[...]]])
                           : insert one point into the given series.
                             columns default to (time, sequence_number, value)
                             (timestamps are in ms)
select ...                 : select statement for data retrieval

misc
----

conn             : display info about current connection
raw <str>        : execute query raw and dump the response
echo <str>       : echo string + newline
writerc          : write current parameters to ~/.influxrc
commands | help  : this menu
exit / ctrl-D    : exit the program

modifiers
---------

command; | <program> [args]  : pipe the output into an external program (example: list series; | sort)
command; > <filename>        : write the output to a file
"#;

/// Session switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Route inserts through the batch committer
    pub async_inserts: bool,
    /// Render timestamps as datetimes
    pub date_time: bool,
    /// Skip series names and headers in select output
    pub records_only: bool,
    /// Print timings after timed commands
    pub timing: bool,
}

pub struct Dispatcher {
    store: Arc<dyn StoreClient>,
    committer: Committer,
    /// Pending connection parameters; `bind` applies them, `writerc` saves them
    config: Config,
    rc_path: Option<PathBuf>,
    options: SessionOptions,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn StoreClient>,
        committer: Committer,
        config: Config,
        options: SessionOptions,
    ) -> Self {
        Self {
            store,
            committer,
            config,
            rc_path: None,
            options,
        }
    }

    /// File written by `writerc`
    pub fn with_rc_path(mut self, path: Option<PathBuf>) -> Self {
        self.rc_path = path;
        self
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Parse and run one input line, writing results to stdout (or the
    /// line's pipe/file target) and errors to stderr
    pub async fn handle_line(&mut self, line: &str) {
        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                return;
            }
        };

        let timed = is_timed(&parsed.command);
        let mut timing = Timing::start();

        let result = match parsed.target {
            OutputTarget::Stdout => {
                let mut out = io::stdout();
                let result = self.execute(parsed.command, &mut out, &mut timing).await;
                let _ = out.flush();
                result
            }
            OutputTarget::File(path) => match File::create(&path) {
                Ok(mut file) => self.execute(parsed.command, &mut file, &mut timing).await,
                Err(e) => {
                    eprintln!("Cannot open {}: {e}", path.display());
                    return;
                }
            },
            OutputTarget::Pipe { program, args } => {
                self.execute_piped(parsed.command, &program, &args, &mut timing)
                    .await
            }
        };

        if let Err(e) = result {
            eprintln!("{e}");
        }

        if timed && self.options.timing {
            println!("timing>");
            println!("{timing}");
        }
    }

    /// Run a command and feed its output to `program`, waiting for it to exit
    async fn execute_piped(
        &mut self,
        command: Command,
        program: &str,
        args: &[String],
        timing: &mut Timing,
    ) -> Result<(), DispatchError> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| io::Error::new(e.kind(), format!("Cannot start {program}: {e}")))?;

        let mut output = Vec::new();
        let result = self.execute(command, &mut output, timing).await;

        if let Some(mut stdin) = child.stdin.take() {
            // a pager quitting early closes its end; that is not an error
            if let Err(e) = stdin.write_all(&output).await {
                tracing::debug!(%program, error = %e, "Pipe target stopped reading");
            }
            // dropping stdin sends EOF
        }

        let status = child.wait().await?;
        if !status.success() {
            tracing::debug!(%program, %status, "Pipe target exited with failure");
        }
        result
    }

    /// Run one command, writing its output to `out`
    ///
    /// `timing` is marked executed once the store answered and printed once
    /// the output was written.
    pub async fn execute(
        &mut self,
        command: Command,
        out: &mut dyn Write,
        timing: &mut Timing,
    ) -> Result<(), DispatchError> {
        match command {
            Command::Bind => {
                let result = self.store.rebind(self.config.connection_settings()).await;
                timing.executed();
                result?;
            }
            Command::Conn => self.write_connection(out).await?,
            Command::CreateAdmin { name, password } => {
                let result = self.store.create_cluster_admin(&name, &password).await;
                timing.executed();
                result?;
            }
            Command::CreateDb(name) => {
                let result = self.store.create_database(&name).await;
                timing.executed();
                result?;
            }
            Command::DeleteAdmin(name) => {
                let result = self.store.delete_cluster_admin(&name).await;
                timing.executed();
                result?;
            }
            Command::DeleteDb(name) => {
                let result = self.store.delete_database(&name).await;
                timing.executed();
                result?;
            }
            Command::DeleteServer(id) => {
                let result = self.store.delete_server(id).await;
                timing.executed();
                result?;
            }
            Command::DropSeries(statement) => {
                let result = self.store.query(&format!("{statement};")).await;
                timing.executed();
                result?;
            }
            Command::Echo(text) => writeln!(out, "{text}")?,
            Command::Insert(series) => {
                if self.options.async_inserts {
                    let result = self.committer.submit(series).await;
                    timing.executed();
                    result?;
                } else {
                    let result = self.store.write_series(std::slice::from_ref(&series)).await;
                    timing.executed();
                    result?;
                }
            }
            Command::ListAdmin => {
                let result = self.store.list_cluster_admins().await;
                timing.executed();
                format::write_admins(out, &result?)?;
            }
            Command::ListDb => {
                let result = self.store.list_databases().await;
                timing.executed();
                for name in result? {
                    writeln!(out, "{name}")?;
                }
            }
            Command::ListSeries(statement) => {
                let result = self.store.query(&statement).await;
                timing.executed();
                format::write_series_names(out, &result?)?;
            }
            Command::ListServers => {
                let result = self.store.list_servers().await;
                timing.executed();
                format::write_servers(out, &result?)?;
            }
            Command::ListShardSpaces => {
                let result = self.store.list_shard_spaces().await;
                timing.executed();
                format::write_shard_spaces(out, &result?)?;
            }
            Command::SetOption { name, arg } => self.set_option(&name, arg, out).await?,
            Command::Ping => {
                let result = self.store.ping().await;
                timing.executed();
                result?;
            }
            Command::Raw(query) => {
                let result = self.store.query(&format!("{query};")).await;
                timing.executed();
                writeln!(out, "{}", serde_json::to_string_pretty(&result?)?)?;
            }
            Command::Select(statement) => {
                let result = self.store.query(&format!("{statement};")).await;
                timing.executed();
                let options = TableOptions {
                    date_time: self.options.date_time,
                    records_only: self.options.records_only,
                };
                format::write_series_tables(out, &result?, options)?;
            }
            Command::UpdateAdmin { name, password } => {
                let result = self.store.update_cluster_admin(&name, &password).await;
                timing.executed();
                result?;
            }
            Command::WriteRc => {
                let path = self.rc_path.as_deref().ok_or(ConfigError::NoHomeDir)?;
                self.config.save(path)?;
                timing.executed();
                writeln!(out, "wrote {}", path.display())?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
        }

        timing.printed();
        Ok(())
    }

    async fn write_connection(&self, out: &mut dyn Write) -> Result<(), DispatchError> {
        let active = self.store.settings().await;
        writeln!(out, "Host        : {}", active.address())?;
        writeln!(out, "User        : {}", active.user)?;
        writeln!(out, "Pass        : {}", active.pass)?;
        writeln!(out, "Db          : {}", active.db)?;
        writeln!(out, "Timeout     : {}ms", active.request_timeout_ms)?;
        writeln!(out, "Async       : {}", self.options.async_inserts)?;
        writeln!(
            out,
            "Async batch : {} series / {}ms",
            self.config.async_capacity, self.config.async_max_wait
        )?;
        Ok(())
    }

    async fn set_option(
        &mut self,
        name: &str,
        arg: Option<String>,
        out: &mut dyn Write,
    ) -> Result<(), DispatchError> {
        match name {
            "async" => {
                if self.options.async_inserts {
                    // pending inserts must land before sync writes resume
                    writeln!(out, "flushing any pending async inserts")?;
                    let flushed = self.committer.force_flush().await?;
                    tracing::debug!(flushed, "Flushed before leaving async mode");
                }
                self.options.async_inserts = !self.options.async_inserts;
                writeln!(out, "async is now {}", self.options.async_inserts)?;
            }
            "dt" => {
                self.options.date_time = !self.options.date_time;
                writeln!(out, "datetime printing is now {}", self.options.date_time)?;
            }
            "r" => {
                self.options.records_only = !self.options.records_only;
                writeln!(out, "records-only is now {}", self.options.records_only)?;
            }
            "t" => {
                self.options.timing = !self.options.timing;
                writeln!(out, "timing is now {}", self.options.timing)?;
            }
            // the client never requests compressed responses
            "comp" => writeln!(out, "compression is now disabled")?,
            "db" => self.config.db = arg.ok_or(DispatchError::MissingArgument("database"))?,
            "user" => self.config.user = arg.ok_or(DispatchError::MissingArgument("user"))?,
            "pass" => self.config.pass = arg.ok_or(DispatchError::MissingArgument("password"))?,
            other => return Err(DispatchError::UnknownOption(other.to_string())),
        }
        Ok(())
    }

    /// Drain the committer, waiting at most `wait`
    pub async fn finish(self, wait: Duration) -> DrainOutcome {
        self.committer.shutdown(wait).await
    }
}

/// Commands that talk to the store get timing output
fn is_timed(command: &Command) -> bool {
    !matches!(
        command,
        Command::Conn | Command::Echo(_) | Command::SetOption { .. } | Command::Help
    )
}
