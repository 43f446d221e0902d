//! Sliding one-second window gate for outgoing DNS queries.
//!
//! [`RateLimiter::wait`] admits a caller only when doing so keeps the number
//! of admissions in the trailing second at or below the configured ceiling,
//! sleeping just long enough for the oldest admission to leave the window.
//! The whole prune/check/sleep/append sequence runs under one async mutex,
//! so the bound holds across concurrent callers sharing a limiter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};
use tracing::trace;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: i64,
    admitted: Mutex<VecDeque<Instant>>,
    total_admissions: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter admitting at most `max_per_second` calls in any
    /// trailing second. Zero or a negative ceiling disables limiting.
    pub fn new(max_per_second: i64) -> Self {
        Self {
            max_per_second,
            admitted: Mutex::new(VecDeque::new()),
            total_admissions: AtomicU64::new(0),
        }
    }

    pub fn max_per_second(&self) -> i64 {
        self.max_per_second
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_per_second <= 0
    }

    /// Waits until admitting one more call keeps the trailing-second count
    /// within the ceiling, then records the admission.
    pub async fn wait(&self) {
        self.total_admissions.fetch_add(1, Ordering::Relaxed);
        if self.is_unlimited() {
            return;
        }
        let ceiling = self.max_per_second as usize;

        let mut admitted = self.admitted.lock().await;
        let mut now = Instant::now();
        expire_old(&mut admitted, now);

        if admitted.len() >= ceiling
            && let Some(&oldest) = admitted.front()
        {
            let pause = WINDOW.saturating_sub(now.saturating_duration_since(oldest));
            if !pause.is_zero() {
                trace!(pause_ms = pause.as_millis() as u64, "rate limit reached, pausing");
                sleep(pause).await;
                now = Instant::now();
                expire_old(&mut admitted, now);
            }
        }

        admitted.push_back(now);
    }

    /// Number of admissions within the trailing second. Drops expired
    /// entries as a side effect; always 0 in unlimited mode.
    pub async fn current_rate(&self) -> usize {
        if self.is_unlimited() {
            return 0;
        }
        let mut admitted = self.admitted.lock().await;
        expire_old(&mut admitted, Instant::now());
        admitted.len()
    }

    /// Total number of `wait()` calls that have returned or are in progress
    /// since the limiter was created.
    pub fn total_admissions(&self) -> u64 {
        self.total_admissions.load(Ordering::Relaxed)
    }
}

/// Drops admissions at least one window old. Entries are pushed in
/// non-decreasing order, so expired ones are always at the front.
fn expire_old(admitted: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = admitted.front() {
        if now.saturating_duration_since(oldest) >= WINDOW {
            admitted.pop_front();
        } else {
            break;
        }
    }
}
