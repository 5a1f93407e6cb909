use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::{BackoffSchedule, ExponentialBackoff};

/// Configures the retry budget and backoff used when retries are enabled.
#[derive(Clone)]
pub struct RetryOptions {
    /// Total attempts, including the first one, for idempotent methods.
    pub max_attempts: u32,
    /// Delay before each retry, indexed by the attempt that just failed.
    pub backoff: Arc<dyn BackoffSchedule>,
}

impl RetryOptions {
    pub fn new(max_attempts: u32, backoff: impl BackoffSchedule + 'static) -> Self {
        Self {
            max_attempts,
            backoff: Arc::new(backoff),
        }
    }

    /// Keeps the attempt budget and switches to exponential backoff from `base`.
    pub fn with_base_backoff(mut self, base: Duration) -> Self {
        self.backoff = Arc::new(ExponentialBackoff::new(base));
        self
    }

    pub(crate) fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new(crate::DEFAULT_RETRY_ATTEMPTS, ExponentialBackoff::default())
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("first_delay", &self.backoff.delay(1))
            .finish()
    }
}
