use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-email submission limiter using a fixed window.
pub struct SubmissionRateLimiter {
    /// lowercase email -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl SubmissionRateLimiter {
    /// `limit == 0` disables limiting.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
        }
    }

    /// Check and count a submission. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.check_at(email, Instant::now())
    }

    pub fn check_at(&self, email: &str, now: Instant) -> Result<(), u64> {
        if self.limit == 0 {
            return Ok(());
        }

        let mut entry = self
            .entries
            .entry(email.trim().to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove entries whose window has expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= self.window);
    }
}
