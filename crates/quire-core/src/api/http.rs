//! HTTP transport for the page API
//!
//! JSON over HTTP using reqwest. Status codes map onto [`PageError`]:
//! 404 on a page route is `NotFound`, any other non-success status or a
//! transport error is `NetworkFailure`, and an undecodable body is
//! `Unconfirmed`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::PageApi;
use crate::config::Config;
use crate::error::{PageError, PageResult};
use crate::models::{
    HealthStatus, LogEntry, NewPage, Page, PageId, PageList, PageUpdate, ServerStatus,
};

/// Page API client backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpPageApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPageApi {
    /// Create a client for the given base URL (e.g. `http://localhost:3000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> PageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PageError::network("Build HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> PageResult<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn page_url(&self, id: &PageId) -> String {
        format!("{}/pages/{}", self.base_url, urlencoding::encode(id.as_str()))
    }

    /// Send a request and classify the response status
    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        page: Option<&PageId>,
    ) -> PageResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| PageError::network(operation, e.to_string()))?;

        let status = response.status();
        debug!("{} -> {}", operation, status);

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = page {
                return Err(PageError::not_found(id));
            }
        }

        if !status.is_success() {
            return Err(PageError::network(
                operation,
                format!("server returned {}", status),
            ));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> PageResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| PageError::network(operation, e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| PageError::unconfirmed(operation, e.to_string()))
    }
}

#[async_trait]
impl PageApi for HttpPageApi {
    async fn list_pages(&self) -> PageResult<Vec<Page>> {
        let op = "List pages";
        let response = self
            .send(op, self.client.get(self.url("pages")), None)
            .await?;
        let list: PageList = Self::decode(op, response).await?;
        Ok(list.pages)
    }

    async fn get_page(&self, id: &PageId) -> PageResult<Page> {
        let op = "Get page";
        let response = self
            .send(op, self.client.get(self.page_url(id)), Some(id))
            .await?;
        Self::decode(op, response).await
    }

    async fn create_page(&self, page: &NewPage) -> PageResult<Page> {
        let op = "Create page";
        let response = self
            .send(op, self.client.post(self.url("pages")).json(page), None)
            .await?;
        Self::decode(op, response).await
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> PageResult<Page> {
        let op = "Update page";
        let response = self
            .send(op, self.client.put(self.page_url(id)).json(update), Some(id))
            .await?;
        Self::decode(op, response).await
    }

    async fn delete_page(&self, id: &PageId) -> PageResult<()> {
        self.send("Delete page", self.client.delete(self.page_url(id)), Some(id))
            .await?;
        Ok(())
    }

    async fn health(&self) -> PageResult<HealthStatus> {
        let op = "Health check";
        let response = self.send(op, self.client.get(self.url("health")), None).await?;
        Self::decode(op, response).await
    }

    async fn server_status(&self) -> PageResult<ServerStatus> {
        let op = "Server status";
        let response = self.send(op, self.client.get(self.url("status")), None).await?;
        Self::decode(op, response).await
    }

    async fn logs(&self) -> PageResult<Vec<LogEntry>> {
        let op = "Server logs";
        let response = self.send(op, self.client.get(self.url("logs")), None).await?;
        Self::decode(op, response).await
    }
}
