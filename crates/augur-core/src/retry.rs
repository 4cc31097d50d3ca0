//! Upstream retry policy.
//!
//! A single value object read from configuration once at startup and
//! passed explicitly to the upstream client, so retry behavior is
//! unit-testable with injected policies instead of environment reads
//! inside the loops.

use std::time::Duration;

/// Default bound for both the outer (reconnect) and inner (re-read) loops.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default pause between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bounded retry behavior for one upstream session.
///
/// Outer attempts cover "cannot reach backend" (worth reopening the
/// connection); inner attempts cover "reached backend but it produced
/// nothing yet" (worth waiting on the same connection). The delay also
/// serves as the idle read window that closes a token batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_outer_attempts: u32,
    pub max_inner_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_outer_attempts: u32, max_inner_attempts: u32, delay: Duration) -> Self {
        Self {
            max_outer_attempts,
            max_inner_attempts,
            delay,
        }
    }

    /// Policy with no sleeps, for tests exercising attempt accounting.
    #[must_use]
    pub const fn immediate(max_outer_attempts: u32, max_inner_attempts: u32) -> Self {
        Self::new(max_outer_attempts, max_inner_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            DEFAULT_RETRY_ATTEMPTS,
            DEFAULT_RETRY_DELAY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_outer_attempts, 3);
        assert_eq!(policy.max_inner_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
