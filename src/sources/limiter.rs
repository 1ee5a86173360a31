//! Per-source admission control.
//!
//! Every provider client funnels its outbound requests through one
//! `RateLimiter`. A call that would exceed the configured ceiling
//! suspends the calling task until the trailing window has room; this
//! is the only intentional blocking point in the crate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window rate limiter: at most `max_per_window` admissions in
/// any trailing `window`.
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter admitting at most `max_per_window` calls per `window`.
    ///
    /// A ceiling of 0 is treated as 1 so `acquire` can always make
    /// progress.
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window,
            admissions: Mutex::new(VecDeque::new()),
        }
    }

    /// Limiter with a conventional one-minute window.
    pub fn per_minute(max_per_minute: u32) -> Self {
        Self::new(max_per_minute, Duration::from_secs(60))
    }

    /// Block until the window admits one more call.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut admissions = self.admissions.lock();
                let now = Instant::now();
                while admissions
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.window)
                {
                    admissions.pop_front();
                }

                if (admissions.len() as u32) < self.max_per_window {
                    admissions.push_back(now);
                    None
                } else {
                    admissions
                        .front()
                        .map(|&t| self.window.saturating_sub(now.duration_since(t)))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    tracing::debug!(?delay, "rate limit reached, delaying request");
                    tokio::time::sleep(delay + Duration::from_millis(1)).await;
                }
            }
        }
    }

    /// Admissions currently counted against the window.
    pub fn in_flight(&self) -> usize {
        let mut admissions = self.admissions.lock();
        let now = Instant::now();
        while admissions
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            admissions.pop_front();
        }
        admissions.len()
    }
}
