//! Asynchronous Batch Committer
//!
//! Decouples `insert` commands from the network write path. Accepted series
//! are buffered and written in bulk when one of four triggers fires:
//!
//! - **capacity**: the buffer holds `capacity` series
//! - **timer**: `max_wait` elapsed since the last flush
//! - **forced**: a caller asked for a flush (e.g. async mode switched off)
//! - **shutdown**: final drain before the committer stops
//!
//! # Architecture
//!
//! ```text
//!   Committer handle ──(bounded mpsc: Insert | Flush | Shutdown)──▶ CommitLoop
//!                                                                   │ owns PendingBatch
//!                                                                   ▼
//!                                                      SeriesWriter::write_series
//! ```
//!
//! A failed write is logged and its batch dropped; the loop keeps running.
//!
//! # Example
//!
//! ```rust,no_run
//! use influx_cli::client::{ConnectionSettings, HttpStoreClient};
//! use influx_cli::committer::{Committer, CommitterConfig, DrainOutcome};
//! use influx_cli::series::{Series, Value};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(HttpStoreClient::new(ConnectionSettings::default())?);
//!     let committer = Committer::spawn(client, CommitterConfig::default())?;
//!
//!     committer
//!         .submit(Series::new("cpu", ["value"]).point(vec![Value::Float(0.5)]))
//!         .await?;
//!
//!     if let DrainOutcome::Completed { flushed } = committer.shutdown(Duration::from_secs(5)).await {
//!         println!("{flushed} series flushed on exit");
//!     }
//!     Ok(())
//! }
//! ```

mod batch;
mod commit_loop;
mod handle;

pub use batch::{FlushTrigger, PendingBatch};
pub use commit_loop::FlushReport;
pub use handle::{Committer, CommitterConfig, CommitterError, DrainOutcome};
