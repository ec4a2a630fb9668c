use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited at {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("authorization rejected for {url}")]
    AuthExpired { url: String },

    #[error("credentials exhausted after {attempts} replacement attempts")]
    CredentialsExhausted { attempts: u32 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("pagination limit reached for {endpoint}: exceeded {max_pages} pages")]
    PageLimit { endpoint: String, max_pages: usize },
}

impl ApiError {
    /// Errors that doom the whole run rather than a single item.
    ///
    /// Once the credential-replacement budget is spent, every request
    /// would fail the same way; the dispatcher stops scheduling work and
    /// propagates this upward.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::CredentialsExhausted { .. })
    }
}
