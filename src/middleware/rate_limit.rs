// src/middleware/rate_limit.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Fixed-window request counter keyed by an arbitrary identifier string.
///
/// A burst straddling a window boundary can admit up to twice the budget
/// within a short span; that is an accepted property of fixed windows, not
/// something this implementation tries to smooth over.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: usize,
    reset_at: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Admit or deny one request for `key` against a budget of
    /// `max_requests` per `window`. Denial never mutates the counter.
    pub async fn allow(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        self.allow_at(key, max_requests, window, Instant::now()).await
    }

    // Admission with an explicit clock so tests can drive the window.
    async fn allow_at(
        &self,
        key: &str,
        max_requests: usize,
        window: Duration,
        now: Instant,
    ) -> bool {
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if now < entry.reset_at => {
                if entry.count >= max_requests {
                    tracing::warn!("rate limit exceeded for key: {}", key);
                    return false;
                }
                entry.count += 1;
                true
            }
            // First request, or the previous window has elapsed
            _ => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + window,
                    },
                );
                true
            }
        }
    }

    /// Drop entries whose window has expired. Runs from a background task;
    /// it reclaims memory and never affects admission decisions.
    pub async fn sweep(&self) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| now < entry.reset_at);
    }

    #[cfg(test)]
    pub async fn tracked_keys(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
