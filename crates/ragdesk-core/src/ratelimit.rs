//! Sliding-window rate limiter for outbound LLM calls
//!
//! Prune, check and record happen under one lock so concurrent callers can
//! never overshoot the window capacity.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window counter over call timestamps
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Try to admit one call now. Admission records the call timestamp
    /// atomically with the check.
    pub fn admit(&self) -> bool {
        self.admit_at(Instant::now())
    }

    fn admit_at(&self, now: Instant) -> bool {
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            // A poisoned window only ever under-counts; fail closed
            Err(_) => return false,
        };

        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Calls currently inside the window
    pub fn current_count(&self) -> usize {
        self.timestamps.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_admits_up_to_max() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.admit());
        assert!(limiter.admit());
        assert!(limiter.admit());
        assert!(!limiter.admit());
        assert_eq!(limiter.current_count(), 3);
    }

    #[test]
    fn test_window_expiry_frees_slots() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        assert!(limiter.admit());
        assert!(!limiter.admit());
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.admit());
    }

    #[test]
    fn test_no_overshoot_under_concurrency() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60), 10));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0usize;
                for _ in 0..10 {
                    if limiter.admit() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 10);
    }
}
