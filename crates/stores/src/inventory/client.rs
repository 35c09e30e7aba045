use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use starbags_core::config::InventoryConfig;
use starbags_core::{InventoryPatch, InventoryRecord, NewInventoryRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryApiError {
    #[error("inventory request to `{url}` failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("inventory service answered {status} for `{url}`: {body}")]
    Status { url: String, status: StatusCode, body: String },
    #[error("inventory response from `{url}` could not be decoded: {source}")]
    Decode { url: String, source: serde_json::Error },
}

impl InventoryApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Remote stock service. Four endpoints: list, create, update by id and delete by id.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list(&self) -> Result<Vec<InventoryRecord>, InventoryApiError>;
    async fn create(&self, record: &NewInventoryRecord) -> Result<InventoryRecord, InventoryApiError>;
    async fn update(
        &self,
        inventory_id: i64,
        patch: &InventoryPatch,
    ) -> Result<InventoryRecord, InventoryApiError>;
    async fn delete(&self, inventory_id: i64) -> Result<(), InventoryApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpInventoryApi {
    client: Client,
    base_url: String,
}

impl HttpInventoryApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InventoryApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| InventoryApiError::Transport { url: base_url.clone(), source })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &InventoryConfig) -> Result<Self, InventoryApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/inventory", self.base_url)
    }

    fn item_url(&self, inventory_id: i64) -> String {
        format!("{}/inventory/{inventory_id}", self.base_url)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, InventoryApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| InventoryApiError::Transport { url: url.to_owned(), source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryApiError::Status { url: url.to_owned(), status, body });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, InventoryApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|source| InventoryApiError::Transport { url: url.to_owned(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|source| InventoryApiError::Decode { url: url.to_owned(), source })
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn list(&self) -> Result<Vec<InventoryRecord>, InventoryApiError> {
        let url = self.collection_url();
        let response = self.send(&url, self.client.get(&url)).await?;
        Self::decode(&url, response).await
    }

    async fn create(&self, record: &NewInventoryRecord) -> Result<InventoryRecord, InventoryApiError> {
        let url = self.collection_url();
        let response = self.send(&url, self.client.post(&url).json(record)).await?;
        Self::decode(&url, response).await
    }

    async fn update(
        &self,
        inventory_id: i64,
        patch: &InventoryPatch,
    ) -> Result<InventoryRecord, InventoryApiError> {
        let url = self.item_url(inventory_id);
        let response = self.send(&url, self.client.put(&url).json(patch)).await?;
        Self::decode(&url, response).await
    }

    async fn delete(&self, inventory_id: i64) -> Result<(), InventoryApiError> {
        let url = self.item_url(inventory_id);
        self.send(&url, self.client.delete(&url)).await?;
        Ok(())
    }
}
