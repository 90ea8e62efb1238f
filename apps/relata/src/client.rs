//! # Catalog HTTP Client
//!
//! Wrapper around the catalog REST API: related records of one record, the
//! bulk related endpoint, and the records multi-search.

use crate::settings::CatalogSettings;
use moka::future::Cache;
use relata_core::{IncomingRelations, MultiSearchResponse, RelationType, join_types};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Max cached related responses.
const MAX_CACHE_CAPACITY: u64 = 1_000;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the catalog.
    #[error("Cannot connect to catalog at {0}")]
    ConnectionFailed(String),
    /// 401/403 - invalid or missing API key, or no privilege.
    #[error("Unauthorized: invalid or missing API key")]
    Unauthorized,
    /// 404 - unknown record.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Any other non-success status.
    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),
    /// Failed to parse response body.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// The HTTP client could not be built.
    #[error("Client setup failed: {0}")]
    Setup(String),
}

/// HTTP client for the catalog API.
#[derive(Clone)]
pub struct RelatedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: Option<Cache<(String, String), IncomingRelations>>,
}

impl RelatedClient {
    /// Create a client pointing at the given catalog URL, without caching.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            cache: None,
        }
    }

    /// Create a client from settings: timeout and related-response cache.
    pub fn from_settings(settings: &CatalogSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        let cache = (settings.cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_CAPACITY)
                .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
                .build()
        });

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            cache,
        })
    }

    /// The catalog base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request to a fixed API path.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.authorized(self.http.request(method, &url))
    }

    /// Add the JSON accept header and optional Bearer auth.
    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(reqwest::header::ACCEPT, "application/json");
        match self.api_key {
            Some(ref key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// `{base}/api/records/{uuidOrId}/related`, with the identifier encoded as
    /// a single path segment.
    fn related_url(&self, uuid_or_id: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Setup(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Setup(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "records", uuid_or_id, "related"]);
        Ok(url)
    }

    /// Handle HTTP response: check status codes and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(resp.url().path().to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// GET /api/records/{uuidOrId}/related?type=..
    pub async fn related(
        &self,
        uuid_or_id: &str,
        types: &[RelationType],
    ) -> Result<IncomingRelations, ClientError> {
        let key = (uuid_or_id.to_string(), join_types(types));
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(record = uuid_or_id, "related served from cache");
                return Ok(hit);
            }
        }

        let url = self.related_url(uuid_or_id)?;
        let req = self
            .authorized(self.http.get(url))
            .query(&type_params(types));
        tracing::debug!(record = uuid_or_id, types = %join_types(types), "GET related");
        let resp = self.send(req).await?;
        let related: IncomingRelations = self.handle_response(resp).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, related.clone()).await;
        }
        Ok(related)
    }

    /// GET /api/related?type=..&uuid=..
    pub async fn related_bulk(
        &self,
        uuids: &[String],
        types: &[RelationType],
    ) -> Result<BTreeMap<String, IncomingRelations>, ClientError> {
        let mut params = type_params(types);
        params.extend(uuids.iter().map(|u| ("uuid", u.clone())));

        let req = self.request(reqwest::Method::GET, "/api/related").query(&params);
        tracing::debug!(records = uuids.len(), types = %join_types(types), "GET bulk related");
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }

    /// POST /api/search/records/_msearch with a newline-delimited body.
    pub async fn msearch(&self, body: String) -> Result<MultiSearchResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/api/search/records/_msearch")
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }
}

fn type_params(types: &[RelationType]) -> Vec<(&'static str, String)> {
    types
        .iter()
        .map(|t| ("type", t.as_str().to_string()))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
