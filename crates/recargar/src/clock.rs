//! Clock abstraction for deterministic waits.
//!
//! The condition waiter is generic over a clock so that timeout behavior can
//! be tested without real sleeps: [`FakeClock`] advances its own time when
//! asked to sleep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic time for poll loops
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Suspend the caller for `duration`
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock time backed by [`Instant`]
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock with its origin at construction time
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fake clock for deterministic tests.
///
/// `sleep` advances fake time instead of blocking, so a 40-second wait
/// window runs instantly while still counting polls and elapsed time.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
    sleeps: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance fake time manually
    pub fn advance(&self, duration: Duration) {
        self.current_ms.fetch_add(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            Ordering::SeqCst,
        );
    }

    /// Number of sleeps performed against this clock
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now_ms() >= a);
    }

    #[test]
    fn test_fake_clock_starts_at_zero() {
        let clock = FakeClock::new();
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn test_fake_clock_sleep_advances_time() {
        let clock = FakeClock::new();
        clock.sleep(Duration::from_millis(200));
        assert_eq!(clock.now_ms(), 200);
        assert_eq!(clock.sleep_count(), 1);
    }

    #[test]
    fn test_fake_clock_advance() {
        let clock = FakeClock::new();
        clock.advance(Duration::from_secs(40));
        assert_eq!(clock.now_ms(), 40_000);
        assert_eq!(clock.sleep_count(), 0);
    }
}
