use std::collections::HashMap;

use time::{Duration, OffsetDateTime};

pub const DEFAULT_COOLDOWN: Duration = Duration::seconds(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Whole seconds left in the cooldown, rounded up. Never zero.
    Denied { seconds_remaining: u64 },
}

/// Per-identity cooldown between accepted submissions.
///
/// Checking never records anything: the caller records only once a
/// submission has actually been stored, so rejected attempts do not
/// restart the cooldown.
pub trait RateLimiter: Send {
    fn check(&self, identity: &str, now: OffsetDateTime) -> RateLimitDecision;

    fn record(&mut self, identity: &str, now: OffsetDateTime);
}

/// Process-local limiter. State is lost on restart.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    cooldown: Duration,
    last_accepted: HashMap<String, OffsetDateTime>,
}

impl InMemoryRateLimiter {
    pub fn new(cooldown: Duration) -> InMemoryRateLimiter {
        InMemoryRateLimiter {
            cooldown,
            last_accepted: HashMap::new(),
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        InMemoryRateLimiter::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, identity: &str, now: OffsetDateTime) -> RateLimitDecision {
        let Some(last) = self.last_accepted.get(identity) else {
            return RateLimitDecision::Allowed;
        };

        // A clock stepping backwards must not stretch the wait past the window.
        let elapsed = Duration::max(Duration::ZERO, now - *last);

        if elapsed >= self.cooldown {
            return RateLimitDecision::Allowed;
        }

        let remaining_nanos = (self.cooldown - elapsed).whole_nanoseconds().unsigned_abs();
        let seconds_remaining = remaining_nanos.div_ceil(1_000_000_000).max(1);

        RateLimitDecision::Denied {
            seconds_remaining: seconds_remaining as u64,
        }
    }

    fn record(&mut self, identity: &str, now: OffsetDateTime) {
        self.last_accepted.insert(identity.to_owned(), now);
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;
    use time::{macros::datetime, Duration};

    use super::{InMemoryRateLimiter, RateLimitDecision, RateLimiter};

    #[test]
    fn unknown_identity_is_allowed() {
        let limiter = InMemoryRateLimiter::default();
        assert_eq!(
            limiter.check("viewer", datetime!(2024-06-01 12:00 UTC)),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn check_does_not_record() {
        let limiter = InMemoryRateLimiter::default();
        let now = datetime!(2024-06-01 12:00 UTC);

        assert_eq!(limiter.check("viewer", now), RateLimitDecision::Allowed);
        assert_eq!(limiter.check("viewer", now), RateLimitDecision::Allowed);
    }

    #[test]
    fn denied_inside_window() {
        let mut limiter = InMemoryRateLimiter::default();
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("viewer", start),
            RateLimitDecision::Denied {
                seconds_remaining: 60
            }
        );
        assert_eq!(
            limiter.check("viewer", start + Duration::seconds(15)),
            RateLimitDecision::Denied {
                seconds_remaining: 45
            }
        );
    }

    #[test]
    fn remaining_seconds_round_up() {
        let mut limiter = InMemoryRateLimiter::default();
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("viewer", start + Duration::milliseconds(59_001)),
            RateLimitDecision::Denied {
                seconds_remaining: 1
            }
        );
        assert_eq!(
            limiter.check("viewer", start + Duration::milliseconds(10_500)),
            RateLimitDecision::Denied {
                seconds_remaining: 50
            }
        );
    }

    #[test]
    fn allowed_once_window_elapses() {
        let mut limiter = InMemoryRateLimiter::default();
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("viewer", start + Duration::seconds(60)),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn identities_are_independent() {
        let mut limiter = InMemoryRateLimiter::default();
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("someone_else", start),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn clock_going_backwards_caps_wait() {
        let mut limiter = InMemoryRateLimiter::default();
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("viewer", start - Duration::minutes(5)),
            RateLimitDecision::Denied {
                seconds_remaining: 60
            }
        );
    }

    #[test]
    fn custom_cooldown() {
        let mut limiter = InMemoryRateLimiter::new(Duration::seconds(5));
        let start = datetime!(2024-06-01 12:00 UTC);
        limiter.record("viewer", start);

        assert_eq!(
            limiter.check("viewer", start + Duration::seconds(5)),
            RateLimitDecision::Allowed
        );
    }
}
