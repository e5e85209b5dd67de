//! Debounce timer for edit coalescing
//!
//! Converts a stream of edit events into a single delayed trigger. Each
//! `arm` replaces the previous deadline, so a continuously-editing user
//! never fires a save until the delay has elapsed after their last edit.
//! Holding the deadline as a single `Option<Instant>` makes the "at most
//! one pending timer" invariant mechanical rather than bookkeeping.

use std::future::pending;
use tokio::time::{sleep_until, Duration, Instant};

/// Single cancellable deadline
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    /// Create a disarmed timer with the given delay
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Arm (or rearm) the timer: the deadline moves to now + delay
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Cancel a pending deadline without side effects
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True while a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Wait for the current deadline; pends forever while disarmed
    ///
    /// Intended for use inside a `select!` loop. Rearming while a caller is
    /// parked here takes effect on the next poll because the returned future
    /// is recreated every loop iteration.
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut timer = DebounceTimer::new(Duration::from_secs(2));
        timer.arm();
        let start = Instant::now();
        timer.fired().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_extends_deadline() {
        let mut timer = DebounceTimer::new(Duration::from_secs(2));
        timer.arm();
        tokio::time::sleep(Duration::from_secs(1)).await;
        timer.arm();
        let start = Instant::now();
        timer.fired().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let mut timer = DebounceTimer::new(Duration::from_millis(100));
        timer.arm();
        timer.cancel();
        assert!(!timer.is_armed());
        let wait = tokio::time::timeout(Duration::from_secs(10), timer.fired()).await;
        assert!(wait.is_err(), "cancelled timer must not fire");
    }
}
