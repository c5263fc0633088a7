//! Clock abstraction for deterministic testing.
//!
//! Decouples the accumulator/trigger engine from the wall clock so that
//! trigger scenarios (§8) can be driven by a fake clock in tests instead of
//! `std::time::Instant`, grounded on the teacher's `Environment` trait.

/// Monotonic microsecond clock (§2 leaf component 1, §9 "Time source").
///
/// # Invariants
///
/// `now_micros()` must never return a value smaller than a previous call
/// within the same process. Implementations backed by `std::time::Instant`
/// satisfy this automatically; fake clocks used in tests must maintain it by
/// construction (e.g. only ever advancing, never rewinding).
pub trait Clock: Send + Sync {
    /// Current time, in microseconds, on an arbitrary monotonic epoch.
    fn now_micros(&self) -> u64;
}

/// Production clock backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is "now".
    #[must_use]
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        #[allow(clippy::cast_possible_truncation)]
        let micros = self.start.elapsed().as_micros() as u64;
        micros
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock::new();
        let t0 = clock.now_micros();
        std::thread::sleep(std::time::Duration::from_micros(50));
        let t1 = clock.now_micros();
        assert!(t1 >= t0);
    }
}
