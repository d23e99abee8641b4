//! influx-cli
//!
//! Command-line interface for an InfluxDB 0.8 style store.

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use influx_cli::commands::{Dispatcher, SessionOptions};
use influx_cli::committer::{Committer, DrainOutcome};
use influx_cli::config::{Config, LoggingConfig};
use influx_cli::{repl, HttpStoreClient};

/// How long pending async inserts may take to land on exit
const EXIT_DRAIN_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "influx-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for InfluxDB 0.8")]
#[command(after_help = "Commands can also be piped into stdin, one per line.")]
struct Cli {
    /// Host to connect to
    #[arg(long)]
    host: Option<String>,

    /// Port to connect to
    #[arg(long)]
    port: Option<u16>,

    /// Influxdb username
    #[arg(long)]
    user: Option<String>,

    /// Influxdb password
    #[arg(long)]
    pass: Option<String>,

    /// Database to use
    #[arg(long)]
    db: Option<String>,

    /// Only show records, no headers or series names
    #[arg(long, alias = "recordsOnly")]
    records_only: bool,

    /// Start with asynchronous inserts enabled
    #[arg(long = "async")]
    async_inserts: bool,

    /// rc file to read (default: ~/.influxrc)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Query to execute on start
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,
}

impl Cli {
    /// Flags win over rc file and environment
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(pass) = &self.pass {
            config.pass = pass.clone();
        }
        if let Some(db) = &self.db {
            config.db = db.clone();
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("influx_cli={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let rc_path = cli.config.clone().or_else(Config::rc_path);
    let mut config = Config::load_with_env(rc_path.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config.logging);

    let settings = config.connection_settings();
    let address = settings.address();
    let store = Arc::new(
        HttpStoreClient::connect(settings)
            .await
            .with_context(|| format!("Cannot connect to {address}"))?,
    );
    tracing::debug!(%address, "Connected");

    let committer = Committer::spawn(store.clone(), config.committer_config())?;
    let options = SessionOptions {
        async_inserts: cli.async_inserts,
        records_only: cli.records_only,
        ..SessionOptions::default()
    };
    let mut dispatcher = Dispatcher::new(store, committer, config, options).with_rc_path(rc_path);

    let query = cli.query.join(" ");
    let result = if !query.trim().is_empty() {
        dispatcher.handle_line(&query).await;
        Ok(())
    } else if !std::io::stdin().is_terminal() {
        repl::run_stdin(&mut dispatcher)
            .await
            .context("Failed to read stdin")
    } else {
        repl::run_interactive(&mut dispatcher, Config::history_path().as_deref())
            .await
            .context("Line editor failed")
    };

    // pending async inserts are drained even when the input loop failed
    match dispatcher.finish(EXIT_DRAIN_WAIT).await {
        DrainOutcome::Completed { flushed } if flushed > 0 => {
            println!("Final {flushed} async inserts committed");
        }
        DrainOutcome::Completed { .. } => {}
        DrainOutcome::Failed { dropped } => {
            eprintln!("Final write failed, {dropped} async inserts were not committed");
        }
        DrainOutcome::TimedOut => {
            eprintln!("Could not commit all async inserts within {EXIT_DRAIN_WAIT:?}, exiting anyway");
        }
        DrainOutcome::AlreadyStopped => {
            eprintln!("Async committer had already stopped, pending inserts may be lost");
        }
    }

    result
}
