//! Store Client
//!
//! The boundary between the CLI and the time-series store.
//!
//! ## Architecture
//!
//! - **SeriesWriter**: bulk write of a batch of series. This is the only
//!   operation the committer needs.
//! - **StoreClient**: everything else the command dispatcher can ask for
//!   (queries, database and admin management, cluster listings, rebinding).
//! - **HttpStoreClient**: the HTTP implementation of both.

mod error;
mod http;
mod models;

pub use error::{ClientError, ClientResult};
pub use http::HttpStoreClient;
pub use models::{ConnectionSettings, QuerySeries, Record, ShardSpace};

use crate::series::Series;
use async_trait::async_trait;

/// Bulk write of series into the store
#[async_trait]
pub trait SeriesWriter: Send + Sync {
    /// Write a batch in one request
    async fn write_series(&self, batch: &[Series]) -> ClientResult<()>;
}

/// Full set of store operations used by the command dispatcher
#[async_trait]
pub trait StoreClient: SeriesWriter {
    /// Check that the server answers
    async fn ping(&self) -> ClientResult<()>;

    /// Run a query verbatim against the selected database
    async fn query(&self, query: &str) -> ClientResult<Vec<QuerySeries>>;

    async fn list_databases(&self) -> ClientResult<Vec<String>>;

    async fn create_database(&self, name: &str) -> ClientResult<()>;

    async fn delete_database(&self, name: &str) -> ClientResult<()>;

    async fn list_cluster_admins(&self) -> ClientResult<Vec<Record>>;

    async fn create_cluster_admin(&self, name: &str, password: &str) -> ClientResult<()>;

    async fn update_cluster_admin(&self, name: &str, password: &str) -> ClientResult<()>;

    async fn delete_cluster_admin(&self, name: &str) -> ClientResult<()>;

    async fn list_servers(&self) -> ClientResult<Vec<Record>>;

    async fn delete_server(&self, id: i64) -> ClientResult<()>;

    async fn list_shard_spaces(&self) -> ClientResult<Vec<ShardSpace>>;

    /// Settings currently in use
    async fn settings(&self) -> ConnectionSettings;

    /// Switch to new settings after verifying them with a ping
    ///
    /// On failure the previous settings stay active.
    async fn rebind(&self, settings: ConnectionSettings) -> ClientResult<()>;
}
