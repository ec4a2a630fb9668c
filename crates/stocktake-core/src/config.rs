use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_login = require("STOCKTAKE_API_LOGIN")?;
    let api_password = require("STOCKTAKE_API_PASSWORD")?;

    let base_url = or_default(
        "STOCKTAKE_BASE_URL",
        "https://api.moysklad.ru/api/remap/1.2/entity",
    );
    let log_level = or_default("STOCKTAKE_LOG_LEVEL", "info");
    let snapshot_path = PathBuf::from(or_default(
        "STOCKTAKE_SNAPSHOT_PATH",
        "./stocktake-snapshot.csv",
    ));
    let user_agent = or_default("STOCKTAKE_USER_AGENT", "stocktake/0.1 (inventory-sync)");

    let page_size = parse_u32("STOCKTAKE_PAGE_SIZE", "1000")?;
    let max_concurrent_fetches = parse_usize("STOCKTAKE_MAX_CONCURRENT_FETCHES", "5")?;
    let max_attempts = parse_u32("STOCKTAKE_MAX_ATTEMPTS", "5")?;
    let max_login_attempts = parse_u32("STOCKTAKE_MAX_LOGIN_ATTEMPTS", "3")?;
    let request_timeout_secs = parse_u64("STOCKTAKE_REQUEST_TIMEOUT_SECS", "120")?;
    let backoff_base_ms = parse_u64("STOCKTAKE_BACKOFF_BASE_MS", "1000")?;
    let retry_after_default_secs = parse_u64("STOCKTAKE_RETRY_AFTER_DEFAULT_SECS", "1")?;

    let price_types = parse_list(&or_default(
        "STOCKTAKE_PRICE_TYPES",
        "Retail,Marketplace,Small Wholesale,Bulk",
    ));
    if price_types.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOCKTAKE_PRICE_TYPES".to_string(),
            reason: "price-type allow-list must name at least one price type".to_string(),
        });
    }
    let category_field = or_default("STOCKTAKE_CATEGORY_FIELD", "Category");
    let barcode_scheme = or_default("STOCKTAKE_BARCODE_SCHEME", "ean13");

    Ok(AppConfig {
        base_url,
        api_login,
        api_password,
        log_level,
        snapshot_path,
        user_agent,
        page_size,
        max_concurrent_fetches,
        max_attempts,
        max_login_attempts,
        request_timeout_secs,
        backoff_base_ms,
        retry_after_default_secs,
        price_types,
        category_field,
        barcode_scheme,
    })
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("STOCKTAKE_API_LOGIN", "ops@example.com");
        m.insert("STOCKTAKE_API_PASSWORD", "hunter2");
        m
    }

    #[test]
    fn build_app_config_fails_without_api_login() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "STOCKTAKE_API_LOGIN"),
            "expected MissingEnvVar(STOCKTAKE_API_LOGIN), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_without_api_password() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STOCKTAKE_API_LOGIN", "ops@example.com");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "STOCKTAKE_API_PASSWORD"),
            "expected MissingEnvVar(STOCKTAKE_API_PASSWORD), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_all_required_vars() {
        let map = full_env();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.api_login, "ops@example.com");
        assert_eq!(cfg.base_url, "https://api.moysklad.ru/api/remap/1.2/entity");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.page_size, 1000);
        assert_eq!(cfg.max_concurrent_fetches, 5);
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.max_login_attempts, 3);
        assert_eq!(cfg.request_timeout_secs, 120);
        assert_eq!(cfg.backoff_base_ms, 1000);
        assert_eq!(cfg.retry_after_default_secs, 1);
        assert_eq!(cfg.category_field, "Category");
        assert_eq!(cfg.barcode_scheme, "ean13");
    }

    #[test]
    fn build_app_config_default_price_types() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.price_types,
            vec!["Retail", "Marketplace", "Small Wholesale", "Bulk"]
        );
    }

    #[test]
    fn build_app_config_price_types_override_trims_entries() {
        let mut map = full_env();
        map.insert("STOCKTAKE_PRICE_TYPES", " Retail , Outlet ,");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.price_types, vec!["Retail", "Outlet"]);
    }

    #[test]
    fn build_app_config_rejects_empty_price_type_list() {
        let mut map = full_env();
        map.insert("STOCKTAKE_PRICE_TYPES", " , ,");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKTAKE_PRICE_TYPES"),
            "expected InvalidEnvVar(STOCKTAKE_PRICE_TYPES), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_page_size_override() {
        let mut map = full_env();
        map.insert("STOCKTAKE_PAGE_SIZE", "250");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.page_size, 250);
    }

    #[test]
    fn build_app_config_max_concurrent_fetches_invalid() {
        let mut map = full_env();
        map.insert("STOCKTAKE_MAX_CONCURRENT_FETCHES", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKTAKE_MAX_CONCURRENT_FETCHES"),
            "expected InvalidEnvVar(STOCKTAKE_MAX_CONCURRENT_FETCHES), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"), "password leaked: {rendered}");
        assert!(rendered.contains("[redacted]"));
    }
}
