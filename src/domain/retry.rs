use crate::error::{EngineError, Result};
use std::time::Duration;

/// Ceiling applied to every computed backoff.
const BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Exponential backoff schedule with a fixed retry budget.
///
/// Immutable value; `backoff_for_attempt` is pure and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Result<Self> {
        if base_delay.is_zero() {
            return Err(EngineError::Config(
                "base_delay must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_retries,
            base_delay,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before retry number `attempt` (1-based) becomes eligible:
    /// `min(base_delay * 2^(attempt - 1), 10s)`. The shift saturates, so the
    /// result is non-decreasing for all attempts.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier).min(BACKOFF_CAP)
    }
}
