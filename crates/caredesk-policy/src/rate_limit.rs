//! Hourly auto-approval cap.
//!
//! A sliding one-hour window over a monotonic clock ([`Instant`]), so
//! wall-clock adjustments cannot skew the window. The limiter is the
//! engine's collaborator: it is consulted only after the pure policy
//! says approve, and a refusal here means the record falls back to
//! human approval — it is never rejected outright.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Sliding-window counter for auto-approvals.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: u32,
    grants: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_window` grants per rolling
    /// hour. A cap of zero disables auto-approval entirely.
    pub fn new(max_per_window: u32) -> Self {
        Self {
            max_per_window,
            grants: VecDeque::new(),
        }
    }

    /// Try to consume one grant at `now`. Returns false when the window
    /// is full; the caller should route the record to human approval.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        while let Some(oldest) = self.grants.front() {
            if now.duration_since(*oldest) >= WINDOW {
                self.grants.pop_front();
            } else {
                break;
            }
        }

        if self.grants.len() as u64 >= u64::from(self.max_per_window) {
            debug!(
                in_window = self.grants.len(),
                cap = self.max_per_window,
                "auto-approval rate cap reached"
            );
            return false;
        }

        self.grants.push_back(now);
        true
    }

    /// How many grants are currently inside the window.
    pub fn in_window(&self, now: Instant) -> usize {
        self.grants
            .iter()
            .filter(|g| now.duration_since(**g) < WINDOW)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
