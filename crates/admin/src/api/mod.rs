//! Remote REST API client.
//!
//! The remote service is the system of record for the catalog, clients,
//! orders and product photos. This module wraps it with a typed client;
//! nothing here keeps state beyond a short-lived category cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfloor_admin::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let page = client
//!     .list_products(&ProductQuery { page: 1, per_page: 24, search: None, category: None })
//!     .await?;
//! ```

mod catalog;
mod clients;
mod orders;
mod photos;
pub mod types;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request was understood but rejected (e.g., invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limited by the remote service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other unsuccessful status.
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Message suitable for showing to an operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NotFound(_) => "The record no longer exists.".to_string(),
            Self::RateLimited(secs) => {
                format!("The server is busy, try again in {secs} seconds.")
            }
            Self::Unauthorized(_) => "The back office is not authorized to do that.".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::InvalidUrl(_) | Self::Status { .. } => {
                "The server could not complete the request.".to_string()
            }
        }
    }
}

/// Error payload returned by the remote API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Cache key for slowly-changing listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
}

/// Remote REST API client.
///
/// Cheaply cloneable; all clones share the connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopfloor-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.category_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                cache,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Resolve a path relative to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Start an authenticated request.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.token.expose_secret())
            .header(ACCEPT, "application/json")
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose body, if any, is ignored.
    async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Map unsuccessful responses to `ApiError`.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(1);

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    tracing::warn!(status = status.as_u16(), %message, "Remote API request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(retry_after),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    })
}
