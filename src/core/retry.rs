use std::time::Duration;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const FETCH_MAX_RETRIES: u32 = 3;
pub const FETCH_BASE_DELAY: Duration = Duration::from_millis(1000);

pub const TOGGLE_TIMEOUT: Duration = Duration::from_secs(15);
pub const TOGGLE_MAX_RETRIES: u32 = 2;
pub const TOGGLE_DELAY: Duration = Duration::from_millis(1000);

const BACKOFF_FACTOR: u32 = 2;
const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base × 2^attempt`
    Exponential,
    /// `base × (attempt + 1)`
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fetch() -> Self {
        Self {
            timeout: FETCH_TIMEOUT,
            max_retries: FETCH_MAX_RETRIES,
            base_delay: FETCH_BASE_DELAY,
            backoff: Backoff::Exponential,
        }
    }

    /// Toggle flips shared state, so it retries less and without doubling.
    pub fn toggle() -> Self {
        Self {
            timeout: TOGGLE_TIMEOUT,
            max_retries: TOGGLE_MAX_RETRIES,
            base_delay: TOGGLE_DELAY,
            backoff: Backoff::Linear,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    /// (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = match self.backoff {
            Backoff::Exponential => BACKOFF_FACTOR.saturating_pow(attempt),
            Backoff::Linear => attempt.saturating_add(1),
        };

        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}
