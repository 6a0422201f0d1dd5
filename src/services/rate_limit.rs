//! Request throttling for the coupon validation endpoint, the one place a
//! client could brute force codes. The limiter is injected through the static
//! context so a shared store can replace the in-process one.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait RateLimiter: Send + Sync {
    /// Counts a request for `key`, returns false once the key is over its limit
    fn check(&self, key: &str) -> bool;
}

/// Limiter that lets everything through
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRateLimiter;

impl RateLimiter for NullRateLimiter {
    fn check(&self, _key: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed window counter kept in process memory
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.window;

        // stale windows of other keys are dropped here, so idle keys do not pile up
        windows.retain(|_, w| now.duration_since(w.started_at) < window);

        match windows.entry(key.to_string()) {
            Entry::Occupied(mut o) => {
                let w = o.get_mut();
                if w.count >= self.max_requests {
                    debug!("Rate limit of {} requests hit by {}.", self.max_requests, key);
                    false
                } else {
                    w.count += 1;
                    true
                }
            }
            Entry::Vacant(v) => {
                v.insert(Window { started_at: now, count: 1 });
                self.max_requests > 0
            }
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }
}
