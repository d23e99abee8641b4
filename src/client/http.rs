//! HTTP Store Client
//!
//! Talks to the store's HTTP API. Credentials travel as `u`/`p` query
//! parameters on every request.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;

use super::error::{ClientError, ClientResult};
use super::models::{ConnectionSettings, QuerySeries, Record, ShardSpace};
use super::{SeriesWriter, StoreClient};
use crate::series::Series;

/// HTTP client for the store API
///
/// Settings sit behind a lock so `bind` can swap credentials in place while
/// the committer keeps writing through the same instance.
pub struct HttpStoreClient {
    http: Client,
    settings: RwLock<ConnectionSettings>,
}

impl std::fmt::Debug for HttpStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStoreClient").finish_non_exhaustive()
    }
}

impl HttpStoreClient {
    /// Create a client without contacting the server
    pub fn new(settings: ConnectionSettings) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            settings: RwLock::new(settings),
        })
    }

    /// Create a client and make sure the server answers a ping
    pub async fn connect(settings: ConnectionSettings) -> ClientResult<Self> {
        let client = Self::new(settings)?;
        client.ping().await?;
        Ok(client)
    }

    fn authed(&self, builder: RequestBuilder, settings: &ConnectionSettings) -> RequestBuilder {
        builder.query(&[("u", settings.user.as_str()), ("p", settings.pass.as_str())])
    }

    fn database(settings: &ConnectionSettings) -> ClientResult<String> {
        if settings.db.is_empty() {
            return Err(ClientError::NoDatabase);
        }
        Ok(urlencoding::encode(&settings.db).into_owned())
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        settings: &ConnectionSettings,
    ) -> ClientResult<Response> {
        let response = self
            .authed(builder, settings)
            .send()
            .await
            .map_err(|e| map_send_error(e, settings))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message: text.trim().to_string(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let settings = self.settings.read().await.clone();
        let url = format!("{}{}", settings.base_url(), path);
        let response = self.send(self.http.get(&url), &settings).await?;
        decode(response).await
    }

    async fn ping_with(&self, settings: &ConnectionSettings) -> ClientResult<()> {
        let url = format!("{}/ping", settings.base_url());
        self.send(self.http.get(&url), settings).await?;
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error, settings: &ConnectionSettings) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::Unavailable(settings.address())
    } else {
        ClientError::Request(e)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl SeriesWriter for HttpStoreClient {
    async fn write_series(&self, batch: &[Series]) -> ClientResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let settings = self.settings.read().await.clone();
        let url = format!(
            "{}/db/{}/series",
            settings.base_url(),
            Self::database(&settings)?
        );

        tracing::trace!(series = batch.len(), db = %settings.db, "Writing series");
        self.send(self.http.post(&url).json(batch), &settings).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn ping(&self) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        self.ping_with(&settings).await
    }

    async fn query(&self, query: &str) -> ClientResult<Vec<QuerySeries>> {
        let settings = self.settings.read().await.clone();
        let url = format!(
            "{}/db/{}/series",
            settings.base_url(),
            Self::database(&settings)?
        );

        let response = self
            .send(self.http.get(&url).query(&[("q", query)]), &settings)
            .await?;

        // Statements like `drop series` answer with an empty body
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn list_databases(&self) -> ClientResult<Vec<String>> {
        let records: Vec<Record> = self.get_json("/db").await?;
        Ok(records
            .into_iter()
            .filter_map(|r| r.get("name").and_then(|n| n.as_str()).map(str::to_string))
            .collect())
    }

    async fn create_database(&self, name: &str) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!("{}/db", settings.base_url());
        let body = serde_json::json!({ "name": name });
        self.send(self.http.post(&url).json(&body), &settings).await?;
        Ok(())
    }

    async fn delete_database(&self, name: &str) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!("{}/db/{}", settings.base_url(), urlencoding::encode(name));
        self.send(self.http.delete(&url), &settings).await?;
        Ok(())
    }

    async fn list_cluster_admins(&self) -> ClientResult<Vec<Record>> {
        self.get_json("/cluster_admins").await
    }

    async fn create_cluster_admin(&self, name: &str, password: &str) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!("{}/cluster_admins", settings.base_url());
        let body = serde_json::json!({ "name": name, "password": password });
        self.send(self.http.post(&url).json(&body), &settings).await?;
        Ok(())
    }

    async fn update_cluster_admin(&self, name: &str, password: &str) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!(
            "{}/cluster_admins/{}",
            settings.base_url(),
            urlencoding::encode(name)
        );
        let body = serde_json::json!({ "password": password });
        self.send(self.http.post(&url).json(&body), &settings).await?;
        Ok(())
    }

    async fn delete_cluster_admin(&self, name: &str) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!(
            "{}/cluster_admins/{}",
            settings.base_url(),
            urlencoding::encode(name)
        );
        self.send(self.http.delete(&url), &settings).await?;
        Ok(())
    }

    async fn list_servers(&self) -> ClientResult<Vec<Record>> {
        self.get_json("/cluster/servers").await
    }

    async fn delete_server(&self, id: i64) -> ClientResult<()> {
        let settings = self.settings.read().await.clone();
        let url = format!("{}/cluster/servers/{}", settings.base_url(), id);
        self.send(self.http.delete(&url), &settings).await?;
        Ok(())
    }

    async fn list_shard_spaces(&self) -> ClientResult<Vec<ShardSpace>> {
        self.get_json("/cluster/shard_spaces").await
    }

    async fn settings(&self) -> ConnectionSettings {
        self.settings.read().await.clone()
    }

    async fn rebind(&self, settings: ConnectionSettings) -> ClientResult<()> {
        self.ping_with(&settings).await?;

        tracing::info!(
            address = %settings.address(),
            user = %settings.user,
            db = %settings.db,
            "Rebound store client"
        );
        *self.settings.write().await = settings;
        Ok(())
    }
}
