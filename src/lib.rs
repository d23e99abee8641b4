//! # influx-cli
//!
//! Command-line client for an InfluxDB 0.8 style time-series store.
//!
//! ## Features
//!
//! - **Command language**: `select`, `insert`, database and admin management,
//!   cluster listings, session options
//! - **Async inserts**: a batch committer buffers inserts and writes them in
//!   bulk on capacity, timer, forced flush or shutdown
//! - **Output modifiers**: pipe any command into a program or write it to a file
//!
//! ## Modules
//!
//! - [`series`]: series, points and typed values
//! - [`client`]: store client traits and the HTTP implementation
//! - [`committer`]: asynchronous batch committer
//! - [`commands`]: command parser and dispatcher
//! - [`config`]: `~/.influxrc` and environment configuration
//! - [`repl`]: interactive and stdin input loops
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use influx_cli::client::HttpStoreClient;
//! use influx_cli::commands::{Dispatcher, SessionOptions};
//! use influx_cli::committer::Committer;
//! use influx_cli::config::Config;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(HttpStoreClient::connect(config.connection_settings()).await?);
//!     let committer = Committer::spawn(store.clone(), config.committer_config())?;
//!
//!     let mut dispatcher = Dispatcher::new(store, committer, config, SessionOptions::default());
//!     dispatcher.handle_line("list db").await;
//!
//!     dispatcher.finish(Duration::from_secs(5)).await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod commands;
pub mod committer;
pub mod config;
pub mod repl;
pub mod series;

pub use client::{ClientError, HttpStoreClient, SeriesWriter, StoreClient};
pub use commands::{Command, DispatchError, Dispatcher, ParseError, SessionOptions};
pub use committer::{Committer, CommitterConfig, CommitterError, DrainOutcome, FlushTrigger};
pub use config::{Config, ConfigError, LoggingConfig};
pub use series::{Point, Series, Value};
