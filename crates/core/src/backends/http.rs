use crate::models::{Endpoints, RawSearchResult};
use crate::traits::SearchBackend;
use crate::PollError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use url::Url;

pub struct HttpSearchBackend {
    client: Arc<Client>,
    base_url: Url,
    endpoints: Endpoints,
}

impl HttpSearchBackend {
    pub fn new(base_url: &str) -> Result<Self, PollError> {
        Ok(Self {
            client: Arc::new(Client::new()),
            base_url: Url::parse(base_url)?,
            endpoints: Endpoints::default(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Swaps in a preconfigured client (proxy, TLS or connection settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Arc::new(client);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, PollError> {
        Ok(self.base_url.join(path)?)
    }

    fn search_url(&self, keywords: &str) -> Result<Url, PollError> {
        let mut url = self.endpoint(&self.endpoints.start_search)?;
        url.query_pairs_mut().append_pair("keywords", keywords);
        Ok(url)
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn index_ready(&self) -> Result<bool, PollError> {
        let url = self.endpoint(&self.endpoints.index_ready)?;
        let response = self.client.get(url).send().await?;
        let body = success_body(response, &self.endpoints.index_ready).await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(ready_flag(&value))
    }

    async fn start_search(&self, keywords: &str) -> Result<(), PollError> {
        let url = self.search_url(keywords)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PollError::BackendResponse {
                endpoint: self.endpoints.start_search.clone(),
                details: response.status().to_string(),
            });
        }
        Ok(())
    }

    async fn fetch_result(&self) -> Result<RawSearchResult, PollError> {
        let url = self.endpoint(&self.endpoints.search_result)?;
        let response = self.client.get(url).send().await?;
        let body = success_body(response, &self.endpoints.search_result).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn success_body(response: Response, endpoint: &str) -> Result<String, PollError> {
    if !response.status().is_success() {
        return Err(PollError::BackendResponse {
            endpoint: endpoint.to_string(),
            details: response.status().to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Only the JSON literal `true` means ready.
fn ready_flag(value: &Value) -> bool {
    match value {
        Value::Bool(ready) => *ready,
        other => {
            warn!(body = %other, "index readiness answered with a non-boolean body");
            false
        }
    }
}
