//! Sliding-window rate limiter for the generative client.
//!
//! The request log is an explicit shared object injected into the client,
//! not process-global state. Cloning a `RateLimiter` shares the same
//! budget, so every call site drawing on the same limiter counts against
//! one window.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::LlmError;

/// Rate limit parameters: at most `max_requests` per sliding `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window limiter. Rejects locally, before any network I/O.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Try to admit one request now.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Throttled`] with the time until the oldest
    /// in-window request ages out when the window is full.
    pub fn try_acquire(&self) -> Result<(), LlmError> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<(), LlmError> {
        let mut requests = self.requests.lock().expect("limiter lock poisoned");

        // Evict entries that have aged out of the window.
        while let Some(&oldest) = requests.front() {
            if now.duration_since(oldest) >= self.config.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.config.max_requests {
            let retry_after = requests
                .front()
                .map(|&oldest| self.config.window.saturating_sub(now.duration_since(oldest)));
            return Err(LlmError::Throttled { retry_after });
        }

        requests.push_back(now);
        Ok(())
    }

    /// Number of requests currently counted in the window.
    pub fn in_flight(&self) -> usize {
        self.requests.lock().expect("limiter lock poisoned").len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: 20,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn admits_up_to_capacity() {
        let limiter = limiter();
        let base = Instant::now();
        for i in 0..20 {
            assert!(
                limiter.try_acquire_at(base + Duration::from_millis(i)).is_ok(),
                "request {i} should be admitted"
            );
        }
        assert_eq!(limiter.in_flight(), 20);
    }

    #[test]
    fn rejects_twenty_first_in_window() {
        let limiter = limiter();
        let base = Instant::now();
        for _ in 0..20 {
            limiter.try_acquire_at(base).unwrap();
        }
        let err = limiter.try_acquire_at(base + Duration::from_secs(1)).unwrap_err();
        match err {
            LlmError::Throttled { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(59)));
            }
            other => panic!("expected Throttled, got {other:?}"),
        }
    }

    #[test]
    fn oldest_aging_out_frees_exactly_one_slot() {
        let limiter = limiter();
        let base = Instant::now();
        // Fill the window: one request at t=0, nineteen at t=30.
        limiter.try_acquire_at(base).unwrap();
        for _ in 0..19 {
            limiter.try_acquire_at(base + Duration::from_secs(30)).unwrap();
        }
        assert!(limiter.try_acquire_at(base + Duration::from_secs(59)).is_err());

        // At t=60 the t=0 request has aged out: exactly one slot frees.
        assert!(limiter.try_acquire_at(base + Duration::from_secs(61)).is_ok());
        assert!(limiter.try_acquire_at(base + Duration::from_secs(61)).is_err());
    }

    #[test]
    fn clones_share_one_budget() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });
        let other = limiter.clone();
        let base = Instant::now();
        limiter.try_acquire_at(base).unwrap();
        other.try_acquire_at(base).unwrap();
        assert!(limiter.try_acquire_at(base).is_err());
        assert!(other.try_acquire_at(base).is_err());
    }
}
