//! Retransmission cadence policy.
//!
//! Expiry of a bounded ACK wait is the sole trigger for retransmission, so
//! the wait duration *is* the retry schedule.  [`RetryPolicy`] makes that
//! schedule explicit and swappable: a fixed interval reproduces the classic
//! stop-and-wait behavior, exponential back-off is available for hostile
//! links.  The ceiling is optional — `max_retries: None` retries forever,
//! which will spin indefinitely against an unreachable peer.

use std::time::Duration;

/// How the wait interval evolves across consecutive retransmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same interval for every attempt.
    Fixed,
    /// Double the interval on each attempt, capped at `max`.
    Exponential { max: Duration },
}

/// Retransmission schedule for one in-flight packet.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// ACK wait for the first transmission.
    pub initial: Duration,
    /// Interval growth across attempts.
    pub backoff: Backoff,
    /// Retransmissions allowed before giving up; `None` = retry forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 500 ms fixed interval; a ceiling so an unreachable peer surfaces
        // as an error instead of a hang.
        Self {
            initial: Duration::from_millis(500),
            backoff: Backoff::Fixed,
            max_retries: Some(20),
        }
    }
}

impl RetryPolicy {
    /// Fixed-interval policy with the given wait and ceiling.
    pub fn fixed(interval: Duration, max_retries: Option<u32>) -> Self {
        Self {
            initial: interval,
            backoff: Backoff::Fixed,
            max_retries,
        }
    }

    /// ACK wait before the retransmission numbered `attempt`
    /// (`attempt = 0` is the first transmission).
    pub fn wait_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.initial,
            Backoff::Exponential { max } => {
                let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
                self.initial
                    .checked_mul(factor)
                    .map_or(max, |d| d.min(max))
            }
        }
    }

    /// `true` once `retries` retransmissions have exhausted the ceiling.
    pub fn exhausted(&self, retries: u32) -> bool {
        self.max_retries.is_some_and(|limit| retries > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_never_varies() {
        let p = RetryPolicy::fixed(Duration::from_millis(500), None);
        for attempt in [0, 1, 5, 100] {
            assert_eq!(p.wait_for(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn unbounded_policy_never_exhausts() {
        let p = RetryPolicy::fixed(Duration::from_millis(10), None);
        assert!(!p.exhausted(1_000_000));
    }

    #[test]
    fn ceiling_exhausts_after_limit() {
        let p = RetryPolicy::fixed(Duration::from_millis(10), Some(3));
        assert!(!p.exhausted(3));
        assert!(p.exhausted(4));
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let p = RetryPolicy {
            initial: Duration::from_millis(100),
            backoff: Backoff::Exponential {
                max: Duration::from_millis(450),
            },
            max_retries: None,
        };
        assert_eq!(p.wait_for(0), Duration::from_millis(100));
        assert_eq!(p.wait_for(1), Duration::from_millis(200));
        assert_eq!(p.wait_for(2), Duration::from_millis(400));
        assert_eq!(p.wait_for(3), Duration::from_millis(450));
        assert_eq!(p.wait_for(31), Duration::from_millis(450));
    }
}
