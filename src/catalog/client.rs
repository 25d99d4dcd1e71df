//! Catalog API client.
//!
//! [`CatalogClient`] is the seam the reconciler talks to; [`HttpCatalogClient`]
//! implements it over the REST API. Every failure is normalised into
//! [`CatalogError`], separating transport problems from structured upstream
//! errors (which carry their own message and, for out-of-range pages, the
//! highest valid page).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::instrument;

use super::models::{
    CaptureResponse, CategoriesEnvelope, ErrorEnvelope, FilterMetadata, Page, PageEnvelope,
};
use super::params::{QueryParams, KEY_LIMIT, KEY_PAGE, KEY_SEARCH, KEY_SORT, KEY_TYPE};

/// Errors from the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network/connectivity failure with no response body.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A well-formed error response from the API.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        max_page: Option<u32>,
    },

    /// Non-2xx response without a structured body.
    #[error("Request failed with status {status}")]
    Http { status: u16 },

    /// A 2xx body that does not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn upstream(status: u16, message: impl Into<String>, max_page: Option<u32>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            max_page,
        }
    }

    /// Highest valid page reported by the API, if this is a range failure.
    pub fn max_page(&self) -> Option<u32> {
        match self {
            Self::Upstream { max_page, .. } => *max_page,
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    pub fn display_message(&self) -> String {
        match self {
            Self::Upstream { message, .. } => message.clone(),
            Self::Transport(e) if e.is_timeout() => "The catalog took too long to respond.".to_string(),
            Self::Transport(_) => "Could not reach the catalog. Is the API running?".to_string(),
            Self::Http { status } => format!("The catalog returned an error (HTTP {status})."),
            Self::Decode(_) => "The catalog sent a response that could not be read.".to_string(),
        }
    }
}

/// Operations the pagination layer needs from the catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page for the given filter.
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page>;

    /// List every category tag in the catalog.
    async fn fetch_categories(&self) -> Result<Vec<String>>;

    /// Capture (`true`) or release (`false`) an item.
    async fn set_captured(&self, id: u64, captured: bool) -> Result<CaptureResponse>;
}

/// REST implementation of [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    client: Client,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query pairs for a page request. Empty category/search are omitted.
    fn page_query(params: &QueryParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            (KEY_PAGE, params.page.to_string()),
            (KEY_LIMIT, params.limit.value().to_string()),
            (KEY_SORT, params.sort.as_str().to_string()),
        ];
        if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
            query.push((KEY_TYPE, category.to_string()));
        }
        if !params.search.is_empty() {
            query.push((KEY_SEARCH, params.search.clone()));
        }
        query
    }
}

/// Turn a non-2xx response into the most specific error its body allows.
async fn error_from_response(response: Response) -> CatalogError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => CatalogError::upstream(status.as_u16(), envelope.error, envelope.max_page),
        Err(_) => CatalogError::Http {
            status: status.as_u16(),
        },
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| CatalogError::Decode(e.to_string()))
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self), fields(page = params.page))]
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page> {
        let response = self
            .client
            .get(self.url("/pokemon"))
            .query(&Self::page_query(params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let envelope: PageEnvelope = decode_json(response).await?;
        if !envelope.success {
            return Err(CatalogError::upstream(
                status.as_u16(),
                envelope.error.unwrap_or_else(|| "Failed to fetch data".to_string()),
                envelope.max_page,
            ));
        }

        let metadata = envelope
            .pagination
            .ok_or_else(|| CatalogError::Decode("Missing pagination".to_string()))?;

        log::debug!(
            "Fetched page {}/{} ({} items)",
            metadata.page,
            metadata.total_pages,
            envelope.data.len()
        );

        Ok(Page {
            items: envelope.data,
            metadata,
            filters: envelope.filters.unwrap_or_else(FilterMetadata::default),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_categories(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("/pokemon/types")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let envelope: CategoriesEnvelope = decode_json(response).await?;
        if !envelope.success {
            return Err(CatalogError::upstream(
                status.as_u16(),
                envelope.error.unwrap_or_else(|| "Failed to fetch types".to_string()),
                None,
            ));
        }
        Ok(envelope.types)
    }

    #[instrument(skip(self))]
    async fn set_captured(&self, id: u64, captured: bool) -> Result<CaptureResponse> {
        let action = if captured { "capture" } else { "release" };
        let response = self
            .client
            .post(self.url(&format!("/pokemon/{id}/{action}")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body: CaptureResponse = decode_json(response).await?;
        if !body.success {
            return Err(CatalogError::upstream(
                status.as_u16(),
                body.error.unwrap_or_else(|| format!("Failed to {action}")),
                None,
            ));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::params::{PageLimit, SortOrder};

    #[test]
    fn test_page_query_omits_empty_filters() {
        let query = HttpCatalogClient::page_query(&QueryParams::default());
        assert_eq!(
            query,
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sort", "asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_query_includes_filters() {
        let params = QueryParams {
            page: 3,
            limit: PageLimit::Twenty,
            sort: SortOrder::Desc,
            category: Some("Fire".to_string()),
            search: "char".to_string(),
        };
        let query = HttpCatalogClient::page_query(&params);
        assert!(query.contains(&("type", "Fire".to_string())));
        assert!(query.contains(&("search", "char".to_string())));
        assert!(query.contains(&("limit", "20".to_string())));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpCatalogClient::with_client("http://localhost:8080/api/", Client::new());
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/pokemon"), "http://localhost:8080/api/pokemon");
    }

    #[test]
    fn test_error_helpers() {
        let err = CatalogError::upstream(400, "Invalid page. Max page allowed is 4 for limit 10.", Some(4));
        assert_eq!(err.max_page(), Some(4));
        assert_eq!(
            err.display_message(),
            "Invalid page. Max page allowed is 4 for limit 10."
        );

        let err = CatalogError::Http { status: 502 };
        assert_eq!(err.max_page(), None);
        assert_eq!(err.to_string(), "Request failed with status 502");
    }
}
