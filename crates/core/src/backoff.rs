// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for reconnect attempts.
//!
//! `delay(n) = min(base * multiplier^(n-1), max_delay)` for attempts
//! `1..=max_attempts`. There is no attempt past `max_attempts`.

use std::time::Duration;

/// Reconnect backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between consecutive retries.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Number of retries before giving up.
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            base_delay: Duration::from_millis(1000),
            multiplier: 1.5,
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl Backoff {
    /// Returns the delay before retry number `attempt` (1-based), or `None`
    /// once the attempt budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = self.base_delay.as_secs_f64() * 1000.0;
        let max_ms = self.max_delay.as_secs_f64() * 1000.0;
        let delay_ms = (base_ms * self.multiplier.powi(exponent)).min(max_ms);

        Some(Duration::from_secs_f64(delay_ms / 1000.0))
    }

    /// Iterates over every delay the policy will ever produce.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).filter_map(|attempt| self.delay_for(attempt))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
