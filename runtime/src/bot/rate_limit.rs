//! Minimum spacing between searches from one user.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    last_seen: DashMap<i64, Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_seen: DashMap::new(),
            min_interval,
        }
    }

    /// Record a request from `user_id`; `false` when it came too soon.
    ///
    /// Rejected requests do not restart the window.
    pub fn check(&self, user_id: i64) -> bool {
        let now = Instant::now();
        match self.last_seen.entry(user_id) {
            Entry::Occupied(mut e) => {
                if now.duration_since(*e.get()) < self.min_interval {
                    return false;
                }
                e.insert(now);
                true
            }
            Entry::Vacant(e) => {
                e.insert(now);
                true
            }
        }
    }

    /// Forget users whose window has passed. Returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let before = self.last_seen.len();
        self.last_seen
            .retain(|_, seen| seen.elapsed() < self.min_interval);
        before - self.last_seen.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_request_within_window_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert!(limiter.check(1));
        assert!(!limiter.check(1));
        assert!(limiter.check(2));
    }

    #[test]
    fn test_window_elapses() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        assert!(limiter.check(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check(1));
    }

    #[test]
    fn test_cleanup_drops_stale_users() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        assert!(limiter.check(1));
        assert!(limiter.check(2));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check(3));
        assert_eq!(limiter.cleanup(), 2);
        assert_eq!(limiter.tracked_users(), 1);
        assert!(!limiter.check(3));
    }
}
