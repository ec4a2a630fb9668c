//! Retry classification and backoff schedule for inventory API requests.
//!
//! The retry loop itself lives in [`crate::client::InventoryClient::get_json`];
//! this module holds the pure pieces so they can be tested without a server.

use std::time::Duration;

use crate::error::ApiError;

/// Delay cap for the exponential schedule.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a delay.
///
/// **Retriable:**
/// - [`ApiError::RateLimited`] — HTTP 429; the server has asked us to back off.
/// - [`ApiError::Http`] — network-level failure (connection reset, timeout).
///
/// **Not retriable (returned immediately):**
/// - [`ApiError::UnexpectedStatus`] — any other non-2xx status; retrying
///   would return the same result.
/// - [`ApiError::Deserialize`] — response body does not parse.
/// - [`ApiError::AuthExpired`] — handled by credential rotation, not backoff.
/// - [`ApiError::CredentialsExhausted`] — fatal for the run.
/// - [`ApiError::InvalidBaseUrl`] / [`ApiError::PageLimit`] — caller bugs
///   and loop guards, not transient conditions.
pub(crate) fn is_retriable(err: &ApiError) -> bool {
    matches!(err, ApiError::RateLimited { .. } | ApiError::Http(_))
}

/// Backoff before the retry following failed attempt number `attempt`
/// (zero-based): `base_ms · 2^attempt`, capped at 60 s, with ±25 % jitter
/// so parallel workers do not retry in lockstep.
pub(crate) fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let computed = base_ms.saturating_mul(1u64 << attempt.min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(jittered)
}
