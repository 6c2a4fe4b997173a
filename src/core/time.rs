//! Default [`TimeSource`] backed by the system clocks.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::traits::TimeSource;

/// System-clock time source.
///
/// Monotonic time is measured from construction; wall-clock time comes
/// from the operating system, which is assumed to be synchronized by the
/// time the session reaches its time-sync step. Embedded targets provide
/// their own [`TimeSource`] instead.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a system clock with its monotonic origin at now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_millis() {
        let clock = SystemClock::new();
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }

    #[test]
    fn test_unix_time_is_set() {
        let clock = SystemClock::new();
        // Any host running the tests is well past the epoch.
        assert!(clock.unix_time() > 1_500_000_000);
    }
}
