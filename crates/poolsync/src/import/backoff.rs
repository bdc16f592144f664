//! Backoff policy for failed page fetches.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

/// Delay before the first retry, in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Ceiling for the retry delay, in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Growth factor between consecutive delays.
pub const BACKOFF_FACTOR: f32 = 2.0;

/// Escalation steps past which the delay is known to sit at the ceiling.
const MAX_ESCALATION_STEPS: u32 = 64;

/// Escalating, capped delay keyed on the backoff level.
///
/// Level 0 means "no failures yet" and maps to no delay. Level `n >= 1` maps
/// to `min_delay * factor^(n-1)`, capped at `max_delay`. No jitter is applied,
/// so the delay for a level is always the same.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub min_delay: Duration,
    /// Maximum delay.
    pub max_delay: Duration,
    /// Multiplier between levels (values below 1.0 are treated as 1.0).
    pub factor: f32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            factor: BACKOFF_FACTOR,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with the default growth factor.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            factor: BACKOFF_FACTOR,
        }
    }

    /// Set the growth factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Build the backon generator for this policy.
    #[must_use]
    pub fn into_backoff(self, max_times: usize) -> ExponentialBuilder {
        let factor = if self.factor.is_finite() {
            self.factor.max(1.0)
        } else {
            BACKOFF_FACTOR
        };

        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_factor(factor)
            .with_max_times(max_times)
    }

    /// Delay to wait at `level` consecutive failures.
    ///
    /// Rounded to whole milliseconds, so a delay that reaches the ceiling is
    /// exactly `max_delay`.
    #[must_use]
    pub fn delay_for(&self, level: u32) -> Duration {
        if level == 0 {
            return Duration::ZERO;
        }

        let ceiling = self.max_delay.max(self.min_delay);
        let steps = level.min(MAX_ESCALATION_STEPS) as usize;
        let raw = self
            .clone()
            .into_backoff(steps)
            .build()
            .take(steps)
            .last()
            .unwrap_or(ceiling);

        // backon scales with f32, which drifts just below exact multiples.
        let millis = (raw.as_secs_f64() * 1_000.0).round() as u64;
        Duration::from_millis(millis).clamp(self.min_delay, ceiling)
    }
}
