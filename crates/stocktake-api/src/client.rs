//! HTTP client for the inventory service's JSON API.
//!
//! One [`InventoryClient`] is shared by the pagination phase and every
//! detail worker. All requests flow through the same retry policy:
//! rate limits honor `Retry-After`, network failures back off
//! exponentially, and 401s rotate the shared credential before retrying.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::credentials::{Credential, CredentialStore};
use crate::error::ApiError;
use crate::retry;
use crate::types::{FolderRow, ItemDetail, ListingRow, RowsPage};

/// Maximum number of pages to fetch from one collection endpoint before
/// returning an error. Prevents infinite loops on a server that keeps
/// returning full pages.
///
/// Note: each page request may be retried up to `max_attempts` times on
/// transient errors, so the effective worst-case request count is
/// `MAX_PAGES * max_attempts`.
pub(crate) const MAX_PAGES: usize = 500;

/// HTTP client for the inventory service.
///
/// Collection fetches (`fetch_all_items`, `fetch_folders`) are
/// all-or-nothing: a failure on any page discards rows already fetched and
/// propagates the error, because a partial listing would produce incorrect
/// change classifications against the previous full snapshot.
pub struct InventoryClient {
    http: Client,
    base_url: Url,
    credentials: Arc<CredentialStore>,
    page_size: u32,
    /// Total number of executions per request, including the first.
    max_attempts: u32,
    backoff_base_ms: u64,
    retry_after_default_secs: u64,
}

impl InventoryClient {
    /// Creates a client from application configuration and a shared
    /// credential store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::InvalidBaseUrl`] if the
    /// configured base URL does not parse.
    pub fn new(
        config: &stocktake_core::AppConfig,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(config, credentials, &config.base_url)
    }

    /// Creates a client with an explicit base URL (for testing with a mock
    /// server).
    ///
    /// # Errors
    ///
    /// Same as [`InventoryClient::new`].
    pub fn with_base_url(
        config: &stocktake_core::AppConfig,
        credentials: Arc<CredentialStore>,
        base_url: &str,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // `Url::join` appends endpoint segments instead of replacing the
        // last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            credentials,
            page_size: config.page_size,
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
            retry_after_default_secs: config.retry_after_default_secs,
        })
    }

    /// Fetches the complete item listing, page by page, in server order.
    ///
    /// Pages are requested at increasing offsets until a page comes back
    /// shorter than the page size (including empty). Rows are concatenated
    /// as received — never reordered or deduplicated here.
    ///
    /// # Errors
    ///
    /// Propagates the first page failure (all-or-nothing), or
    /// [`ApiError::PageLimit`] if the server never returns a short page.
    pub async fn fetch_all_items(&self, filter: Option<&str>) -> Result<Vec<ListingRow>, ApiError> {
        self.fetch_all_rows("assortment", filter).await
    }

    /// Fetches the complete folder catalog.
    ///
    /// # Errors
    ///
    /// Same contract as [`InventoryClient::fetch_all_items`].
    pub async fn fetch_folders(&self) -> Result<Vec<FolderRow>, ApiError> {
        self.fetch_all_rows("productfolder", None).await
    }

    /// Fetches one item's detail payload from its listing `href`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RateLimited`] / [`ApiError::Http`] — after all attempts
    ///   are exhausted.
    /// - [`ApiError::UnexpectedStatus`] — any non-retryable status (not retried).
    /// - [`ApiError::Deserialize`] — body is not a valid detail object.
    /// - [`ApiError::CredentialsExhausted`] — credential rotation budget spent.
    pub async fn fetch_item_detail(&self, href: &str) -> Result<ItemDetail, ApiError> {
        self.get_json(href).await
    }

    async fn fetch_all_rows<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>, ApiError> {
        let limit = self.page_size;
        let mut all_rows: Vec<T> = Vec::new();
        let mut offset: u64 = 0;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ApiError::PageLimit {
                    endpoint: endpoint.to_owned(),
                    max_pages: MAX_PAGES,
                });
            }

            let url = self.collection_url(endpoint, limit, offset, filter)?;
            tracing::debug!(endpoint, offset, "fetching collection page");
            let page: RowsPage<T> = self.get_json(url.as_str()).await?;

            let row_count = page.rows.len();
            all_rows.extend(page.rows);

            // A short page (including an empty one) is the last page.
            if row_count < limit as usize {
                break;
            }
            offset += u64::from(limit);
        }

        Ok(all_rows)
    }

    /// Executes one GET with the full retry policy and deserializes the
    /// JSON body.
    ///
    /// At most `max_attempts` executions: 429 sleeps at least the server's
    /// `Retry-After` (default when absent comes from configuration), network
    /// errors back off exponentially with jitter, 401 rotates the shared
    /// credential and retries with the replacement. Any other non-2xx status
    /// and malformed bodies are returned immediately.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut attempt = 0u32;
        loop {
            let (generation, credential) = self.credentials.current().await;
            let err = match self.execute_once::<T>(url, &credential).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempt += 1;

            if matches!(err, ApiError::AuthExpired { .. }) {
                tracing::warn!(url, "authorization rejected — requesting replacement credentials");
                // Fatal once the rotation budget is spent.
                self.credentials.rotate(generation).await?;
                if attempt >= self.max_attempts {
                    return Err(err);
                }
                continue;
            }

            if !retry::is_retriable(&err) || attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = match &err {
                ApiError::RateLimited {
                    retry_after_secs, ..
                } => Duration::from_secs(*retry_after_secs),
                _ => retry::backoff_delay(attempt - 1, self.backoff_base_ms),
            };
            tracing::warn!(
                url,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient fetch error — retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn execute_once<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .basic_auth(&credential.login, Some(&credential.secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthExpired {
                url: url.to_owned(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(self.retry_after_default_secs);
            return Err(ApiError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ApiError::Deserialize {
            context: format!("response from {url}"),
            source: e,
        })
    }

    /// Builds a collection URL for the given endpoint, page size, offset,
    /// and optional filter expression.
    fn collection_url(
        &self,
        endpoint: &str,
        limit: u32,
        offset: u64,
        filter: Option<&str>,
    ) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ApiError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        if let Some(expr) = filter {
            url.query_pairs_mut().append_pair("filter", expr);
        }

        Ok(url)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
