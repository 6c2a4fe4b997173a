//! Pacing for the reconciliation request.
//!
//! The request is re-sent while the handshake response is outstanding,
//! but at most once per interval, to bound retry traffic.

use std::time::Duration;

use crate::core::constants::LAST_VALUES_REQUEST_INTERVAL;

/// Gates a repeated request to at most once per fixed interval.
///
/// A timer that has never fired (or was reset) fires immediately, so a
/// fresh or reconnecting session does not sit out a full interval
/// before its first request.
#[derive(Debug, Clone)]
pub struct RequestTimer {
    last_fired: Option<u64>,
    interval_ms: u64,
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::new(LAST_VALUES_REQUEST_INTERVAL)
    }
}

impl RequestTimer {
    /// Create a timer with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            last_fired: None,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// Whether a request may be issued at monotonic time `now_ms`.
    pub fn should_fire(&self, now_ms: u64) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.interval_ms,
        }
    }

    /// Record that a request was issued at `now_ms`.
    pub fn mark_fired(&mut self, now_ms: u64) {
        self.last_fired = Some(now_ms);
    }

    /// Forget the last firing so the next check fires immediately.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    /// Configured minimum interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_immediately_when_fresh() {
        let timer = RequestTimer::new(Duration::from_secs(10));
        assert!(timer.should_fire(0));
        assert!(timer.should_fire(5));
    }

    #[test]
    fn test_guards_interval() {
        let mut timer = RequestTimer::new(Duration::from_secs(10));
        timer.mark_fired(1_000);

        assert!(!timer.should_fire(1_000));
        assert!(!timer.should_fire(10_999));
        assert!(!timer.should_fire(11_000));
        assert!(timer.should_fire(11_001));
    }

    #[test]
    fn test_reset_rearms() {
        let mut timer = RequestTimer::new(Duration::from_secs(10));
        timer.mark_fired(1_000);
        assert!(!timer.should_fire(1_500));

        timer.reset();
        assert!(timer.should_fire(1_500));
    }

    #[test]
    fn test_clock_going_backwards_does_not_fire() {
        let mut timer = RequestTimer::new(Duration::from_secs(10));
        timer.mark_fired(5_000);
        // Saturating arithmetic: an earlier timestamp reads as elapsed 0.
        assert!(!timer.should_fire(4_000));
    }
}
