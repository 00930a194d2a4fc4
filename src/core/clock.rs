//! High-resolution clock with freeze semantics for pause/resume.

#[cfg(feature = "web")]
use web_sys::window;

#[cfg(not(feature = "web"))]
use std::time::Instant;

/// A clock measuring elapsed time that can be frozen.
///
/// While paused, [`elapsed`](Clock::elapsed) keeps returning the value it had
/// at the moment of the pause; resuming continues from that frozen value
/// rather than jumping to wall-clock time. The frame scheduler relies on this
/// to avoid a delta-time spike after a long tab-hidden period.
pub struct Clock {
    /// Whether the clock is accumulating time.
    running: bool,
    /// Wall-clock time (seconds) at the last accumulation.
    old_time: f64,
    /// Total accumulated time while running.
    elapsed_time: f64,

    #[cfg(not(feature = "web"))]
    instant: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock {
    /// Create a new running clock.
    pub fn start() -> Self {
        let mut clock = Self {
            running: true,
            old_time: 0.0,
            elapsed_time: 0.0,
            #[cfg(not(feature = "web"))]
            instant: Instant::now(),
        };
        clock.old_time = clock.now();
        clock
    }

    /// Get the current wall-clock time in seconds.
    fn now(&self) -> f64 {
        #[cfg(feature = "web")]
        {
            window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0)
        }

        #[cfg(not(feature = "web"))]
        {
            self.instant.elapsed().as_secs_f64()
        }
    }

    /// Fold wall-clock time since the last accumulation into the total.
    fn accumulate(&mut self) {
        let new_time = self.now();
        self.elapsed_time += new_time - self.old_time;
        self.old_time = new_time;
    }

    /// Freeze the clock. Elapsed time stops advancing.
    pub fn pause(&mut self) {
        if self.running {
            self.accumulate();
            self.running = false;
        }
    }

    /// Unfreeze the clock, continuing from the frozen elapsed value.
    pub fn resume(&mut self) {
        if !self.running {
            self.old_time = self.now();
            self.running = true;
        }
    }

    /// Get the elapsed time in seconds. Constant while paused.
    pub fn elapsed(&mut self) -> f64 {
        if self.running {
            self.accumulate();
        }
        self.elapsed_time
    }

    /// Check if the clock is accumulating time.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn starts_running() {
        let clock = Clock::start();
        assert!(clock.is_running());
    }

    #[test]
    fn elapsed_advances_while_running() {
        let mut clock = Clock::start();
        sleep(Duration::from_millis(10));
        assert!(clock.elapsed() >= 0.01);
    }

    #[test]
    fn elapsed_freezes_while_paused() {
        let mut clock = Clock::start();
        sleep(Duration::from_millis(5));
        clock.pause();
        let frozen = clock.elapsed();

        sleep(Duration::from_millis(100));
        assert_eq!(clock.elapsed(), frozen);
    }

    #[test]
    fn resume_continues_from_frozen_value() {
        let mut clock = Clock::start();
        sleep(Duration::from_millis(5));
        clock.pause();
        let frozen = clock.elapsed();

        sleep(Duration::from_millis(100));
        clock.resume();
        let after = clock.elapsed();

        // The 100 ms pause must not appear in the elapsed time.
        assert!(after >= frozen);
        assert!(after - frozen < 0.05, "paused wall time leaked: {}", after - frozen);
    }

    #[test]
    fn pause_twice_is_idempotent() {
        let mut clock = Clock::start();
        clock.pause();
        let frozen = clock.elapsed();
        clock.pause();
        assert_eq!(clock.elapsed(), frozen);
    }
}
