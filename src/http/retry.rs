//! Retry loop with exponential backoff and the caller-supplied retry check.

use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::HttpError;
use super::response::Response;

/// Per-attempt network deadline used by [`Client::new`](super::Client::new).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Additional attempts after the first, used by [`Client::new`](super::Client::new).
pub const DEFAULT_RETRIES: u32 = 0;

/// Backoff before the attempt following attempt `i` is `BACKOFF_BASE_MS * 2^i`.
pub const BACKOFF_BASE_MS: u64 = 50;

/// Decides whether a successful response is final (`true`) or needs a retry (`false`).
pub type ReCheck = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// Accepts every response.
pub fn default_recheck() -> ReCheck {
    Arc::new(|_| true)
}

/// Delay slept after attempt `attempt` (0-based) failed: `50ms * 2^attempt`.
///
/// Saturates instead of overflowing for very large attempt counts.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor))
}

/// Runs `operation` up to `retries + 1` times.
///
/// An attempt is final when it succeeds and `accept` returns true for its
/// value, or when it fails with a non-retryable error. Otherwise the loop
/// sleeps for [`backoff_delay`] and tries again while attempts remain. The
/// outcome of the last attempt is returned as is.
pub async fn with_retry<F, Fut, T, A>(
    operation_name: &str,
    retries: u32,
    accept: A,
    mut operation: F,
) -> Result<T, HttpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
    A: Fn(&T) -> bool,
{
    let total = retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        let outcome = operation().await;

        let retry_reason = match &outcome {
            Ok(value) if accept(value) => None,
            Ok(_) => Some("response rejected by retry check".to_string()),
            Err(e) if !e.is_retryable() => {
                debug!("{}: non-retryable error: {}", operation_name, e);
                None
            }
            Err(e) => Some(describe(e)),
        };

        let Some(reason) = retry_reason else {
            return outcome;
        };

        if attempt + 1 >= total {
            debug!(
                "{}: giving up after {} attempt(s) ({})",
                operation_name, total, reason
            );
            return outcome;
        }

        let delay = backoff_delay(attempt);
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
            operation_name,
            attempt + 1,
            total,
            reason,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// The error and its immediate cause on one line.
fn describe(e: &HttpError) -> String {
    match std::error::Error::source(e) {
        Some(source) => format!("{}: {}", e, source),
        None => e.to_string(),
    }
}
