//! Retry decisions: which statuses, methods and transport errors are worth
//! another attempt, and how long to wait before it.

use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::transport::TransportError;

/// Returns `true` for the transient statuses 429, 500, 502, 503 and 504.
///
/// 501 and 505 describe permanent server capabilities and are not retried.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Returns `true` for GET, HEAD, PUT, DELETE, OPTIONS and TRACE.
///
/// Matching ignores ASCII case and surrounding whitespace.
pub fn is_idempotent_method(method: &str) -> bool {
    const IDEMPOTENT: [&str; 6] = ["GET", "HEAD", "PUT", "DELETE", "OPTIONS", "TRACE"];
    let method = method.trim();
    IDEMPOTENT
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(method))
}

/// Returns `true` when the error reports a timeout or a temporary condition.
pub fn is_retryable_error(err: &TransportError) -> bool {
    err.signals()
        .is_some_and(|signals| signals.timeout || signals.temporary)
}

/// `base * 2^(attempt - 1)` for 1-based `attempt`.
///
/// Growth is unbounded apart from saturating at `Duration::MAX`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = attempt.max(1) - 1;
    let multiplier = 1u32.checked_shl(exp).unwrap_or(0);
    if multiplier == 0 {
        return if base.is_zero() { base } else { Duration::MAX };
    }
    base.saturating_mul(multiplier)
}

/// Maps a 1-based attempt index to the delay before the next attempt.
pub trait BackoffSchedule: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Doubling delay with no cap and no jitter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExponentialBackoff {
    pub base: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(crate::DEFAULT_BASE_BACKOFF)
    }
}

impl BackoffSchedule for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(self.base, attempt)
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
///
/// Which of the two finished is not reported; callers check the token.
pub async fn sleep_backoff(cancel: &CancellationToken, delay: Duration) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(delay) => {}
    }
}
