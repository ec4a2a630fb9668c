use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub api_login: String,
    pub api_password: String,
    pub log_level: String,
    pub snapshot_path: PathBuf,
    pub user_agent: String,
    pub page_size: u32,
    pub max_concurrent_fetches: usize,
    pub max_attempts: u32,
    pub max_login_attempts: u32,
    pub request_timeout_secs: u64,
    pub backoff_base_ms: u64,
    pub retry_after_default_secs: u64,
    /// Price-type names copied into the normalized price map; everything
    /// else in `salePrices` is dropped.
    pub price_types: Vec<String>,
    pub category_field: String,
    pub barcode_scheme: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("api_login", &self.api_login)
            .field("api_password", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("snapshot_path", &self.snapshot_path)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("max_attempts", &self.max_attempts)
            .field("max_login_attempts", &self.max_login_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("retry_after_default_secs", &self.retry_after_default_secs)
            .field("price_types", &self.price_types)
            .field("category_field", &self.category_field)
            .field("barcode_scheme", &self.barcode_scheme)
            .finish()
    }
}
