//! Per-identity token bucket.

use std::time::Instant;

use super::RateLimitExceeded;

/// Token bucket for one tracked identity.
///
/// Refill is continuous: `tokens = min(capacity + burst, tokens + rate * elapsed)`.
/// Tokens stay within `0..=capacity + burst`.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    tokens: f64,
    last_refill_at: Instant,
    capacity: u32,
    burst_size: u32,
    refill_rate_per_second: f64,
}

impl RateLimitState {
    /// A fresh bucket starts at `capacity` tokens.
    pub fn new(capacity: u32, burst_size: u32, refill_rate_per_second: f64, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill_at: now,
            capacity,
            burst_size,
            refill_rate_per_second: refill_rate_per_second.max(0.0),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn last_refill_at(&self) -> Instant {
        self.last_refill_at
    }

    fn ceiling(&self) -> f64 {
        f64::from(self.capacity) + f64::from(self.burst_size)
    }

    /// Balance at `now` without mutating the bucket.
    pub fn balance_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill_at).as_secs_f64();
        (self.tokens + self.refill_rate_per_second * elapsed).clamp(0.0, self.ceiling())
    }

    pub fn refill(&mut self, now: Instant) {
        self.tokens = self.balance_at(now);
        if now > self.last_refill_at {
            self.last_refill_at = now;
        }
    }

    /// Refill, then take `cost` tokens or fail without taking any.
    pub fn try_consume(&mut self, cost: u32, now: Instant) -> Result<(), RateLimitExceeded> {
        self.refill(now);

        let cost = f64::from(cost);
        if self.tokens >= cost {
            self.tokens -= cost;
            return Ok(());
        }

        Err(RateLimitExceeded {
            retry_after_seconds: self.seconds_until(cost),
        })
    }

    /// Whole seconds until the balance reaches `target`, rounded up.
    pub fn seconds_until(&self, target: f64) -> u64 {
        let deficit = target - self.tokens;
        if deficit <= 0.0 {
            return 0;
        }
        if self.refill_rate_per_second <= 0.0 {
            return u64::MAX;
        }
        (deficit / self.refill_rate_per_second).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_refill_is_continuous_and_capped() {
        let start = Instant::now();
        let mut state = RateLimitState::new(10, 2, 1.0, start);
        for _ in 0..10 {
            state.try_consume(1, start).unwrap();
        }
        assert_eq!(state.balance_at(start), 0.0);
        assert_eq!(state.balance_at(start + Duration::from_millis(2500)), 2.5);
        assert_eq!(state.balance_at(start + Duration::from_secs(3600)), 12.0);
    }

    #[test]
    fn test_failed_consume_takes_nothing() {
        let start = Instant::now();
        let mut state = RateLimitState::new(3, 0, 0.5, start);
        let err = state.try_consume(5, start).unwrap_err();
        // deficit 2 tokens at 0.5/s
        assert_eq!(err.retry_after_seconds, 4);
        assert_eq!(state.balance_at(start), 3.0);
        assert!(state.try_consume(3, start).is_ok());
    }

    #[test]
    fn test_clock_going_backwards_does_not_refill() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut state = RateLimitState::new(1, 0, 1.0, start);
        state.try_consume(1, start).unwrap();
        let earlier = start - Duration::from_secs(5);
        assert!(state.try_consume(1, earlier).is_err());
        assert_eq!(state.last_refill_at(), start);
    }

    #[test]
    fn test_zero_rate_never_refills() {
        let start = Instant::now();
        let mut state = RateLimitState::new(1, 0, 0.0, start);
        state.try_consume(1, start).unwrap();
        let err = state.try_consume(1, start + Duration::from_secs(60)).unwrap_err();
        assert_eq!(err.retry_after_seconds, u64::MAX);
    }
}
