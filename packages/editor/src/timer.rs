//! Host-driven repeating timers.
//!
//! The editor owns no event loop. Hosts forward wall-clock instants into
//! [`crate::Editor::tick`] and each armed timer reports whether its
//! deadline passed. Anything from a `tokio` interval to a test passing
//! hand-rolled instants can drive these.

use std::time::{Duration, Instant};

/// A repeating deadline that only advances when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatTimer {
    period: Duration,
    next: Option<Instant>,
}

impl RepeatTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    /// Arms the timer. Starting an already running timer keeps the
    /// existing deadline.
    pub fn start(&mut self, now: Instant) {
        if self.next.is_none() {
            self.next = Some(now + self.period);
        }
    }

    /// Disarms the timer; a stale deadline can never fire afterwards.
    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Reports whether the deadline passed, scheduling the next one when
    /// it did.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next {
            Some(deadline) if now >= deadline => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_advances_deadline() {
        let start = Instant::now();
        let mut timer = RepeatTimer::new(Duration::from_millis(200));
        timer.start(start);

        assert!(!timer.fire(start));
        assert!(timer.fire(start + Duration::from_millis(200)));
        // next deadline moved to +400ms
        assert!(!timer.fire(start + Duration::from_millis(300)));
        assert!(timer.fire(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_start_while_running_keeps_deadline() {
        let start = Instant::now();
        let mut timer = RepeatTimer::new(Duration::from_millis(200));
        timer.start(start);
        timer.start(start + Duration::from_millis(150));

        // deadline still measured from the first start
        assert!(timer.fire(start + Duration::from_millis(200)));
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let start = Instant::now();
        let mut timer = RepeatTimer::new(Duration::from_millis(200));
        timer.start(start);
        timer.stop();

        assert!(!timer.is_running());
        assert!(!timer.fire(start + Duration::from_secs(10)));
    }
}
