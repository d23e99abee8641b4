//! Connection settings and response models

use serde::{Deserialize, Serialize};

/// A loosely-typed JSON object returned by listing endpoints
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Where and as whom the client talks to the store
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// Empty when no database is selected
    pub db: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            user: "root".to_string(),
            pass: "root".to_string(),
            db: String::new(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ConnectionSettings {
    /// `host:port` as used in messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the HTTP API
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }
}

/// A series as returned by a query
///
/// Unlike written series, query results may carry any JSON value
/// (numbers, strings, booleans, nulls), so points stay untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySeries {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub points: Vec<Vec<serde_json::Value>>,
}

/// Shard space description from `/cluster/shard_spaces`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardSpace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub retention_policy: String,
    #[serde(default)]
    pub shard_duration: String,
    #[serde(default)]
    pub replication_factor: u32,
    #[serde(default)]
    pub split: u32,
}
