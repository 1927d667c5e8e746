//! A sliding-window limiter for login attempts.
//!
//! The limiter state is persisted between page loads (it mirrors the
//! local-storage record the login form keeps), so a failed-attempt
//! streak survives a refresh. Time is passed in by the caller as unix
//! milliseconds, which keeps the limiter deterministic in tests.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Maximum failed attempts within the window before lockout.
pub const MAX_ATTEMPTS: usize = 5;

/// The sliding window, in milliseconds (15 minutes).
pub const WINDOW_MS: u64 = 15 * 60 * 1000;

/// Returned when a login attempt is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RateLimited {
    /// How long until the next attempt is allowed, in milliseconds.
    pub retry_after_ms: u64,
}

impl Display for RateLimited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "too many login attempts, retry in {} ms",
            self.retry_after_ms
        )
    }
}

impl StdError for RateLimited {}

/// Failed login attempt tracker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRateLimiter {
    failures: Vec<u64>,
}

impl LoginRateLimiter {
    /// Creates a tracker with no recorded failures.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok` when an attempt is allowed at `now_ms`, or the
    /// remaining lockout time when the window is saturated.
    pub fn check(&self, now_ms: u64) -> Result<(), RateLimited> {
        let mut in_window =
            self.failures.iter().copied().filter(|&t| {
                now_ms.saturating_sub(t) < WINDOW_MS
            });
        let Some(oldest) = in_window.next() else {
            return Ok(());
        };
        if in_window.count() + 1 < MAX_ATTEMPTS {
            return Ok(());
        }
        Err(RateLimited {
            retry_after_ms: (oldest + WINDOW_MS).saturating_sub(now_ms),
        })
    }

    /// Records a failed attempt; expired entries are dropped.
    pub fn record_failure(&mut self, now_ms: u64) {
        self.failures
            .retain(|&t| now_ms.saturating_sub(t) < WINDOW_MS);
        self.failures.push(now_ms);
    }

    /// Clears the tracker after a successful sign-in.
    #[inline]
    pub fn reset(&mut self) {
        self.failures.clear();
    }
}
