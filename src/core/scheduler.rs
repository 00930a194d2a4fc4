//! Per-frame scheduling with pause/resume on visibility changes.

use super::Clock;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Frames are being produced.
    Running,
    /// The host is hidden; no frames are produced and the clock is frozen.
    Paused,
}

/// Timing values for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    /// Seconds since the scene started, excluding paused periods.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// Drives the per-frame tick.
///
/// A two-state machine: `Running` produces a [`FrameTiming`] per call to
/// [`begin_frame`](FrameScheduler::begin_frame), `Paused` produces nothing.
/// Visibility loss freezes the elapsed-time clock; visibility regain resumes
/// it from the frozen value and re-anchors the previous-frame time so the
/// first delta after a resume stays small instead of spanning the whole
/// hidden period.
pub struct FrameScheduler {
    clock: Clock,
    state: SchedulerState,
    previous_time: f64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Create a new scheduler in the `Running` state.
    pub fn new() -> Self {
        Self {
            clock: Clock::start(),
            state: SchedulerState::Running,
            previous_time: 0.0,
        }
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Apply a visibility-change notification from the host.
    pub fn set_visible(&mut self, visible: bool) {
        match (self.state, visible) {
            (SchedulerState::Running, false) => {
                self.clock.pause();
                self.state = SchedulerState::Paused;
                log::debug!("frame scheduler paused");
            }
            (SchedulerState::Paused, true) => {
                self.clock.resume();
                self.previous_time = self.clock.elapsed();
                self.state = SchedulerState::Running;
                log::debug!("frame scheduler resumed at {:.3}s", self.previous_time);
            }
            _ => {}
        }
    }

    /// Begin a frame, returning its timing, or `None` while paused.
    pub fn begin_frame(&mut self) -> Option<FrameTiming> {
        if self.state == SchedulerState::Paused {
            return None;
        }

        let elapsed = self.clock.elapsed();
        let delta = elapsed - self.previous_time;
        self.previous_time = elapsed;

        Some(FrameTiming {
            elapsed: elapsed as f32,
            delta: delta as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn produces_frames_while_running() {
        let mut scheduler = FrameScheduler::new();
        let first = scheduler.begin_frame().unwrap();
        let second = scheduler.begin_frame().unwrap();
        assert!(second.elapsed >= first.elapsed);
        assert!(second.delta >= 0.0);
    }

    #[test]
    fn paused_scheduler_skips_frames() {
        let mut scheduler = FrameScheduler::new();
        scheduler.set_visible(false);
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert!(scheduler.begin_frame().is_none());
    }

    #[test]
    fn no_delta_spike_after_resume() {
        let mut scheduler = FrameScheduler::new();
        scheduler.begin_frame().unwrap();

        scheduler.set_visible(false);
        sleep(Duration::from_millis(100));
        scheduler.set_visible(true);

        let timing = scheduler.begin_frame().unwrap();
        // The 100 ms hidden gap must not show up as simulation time.
        assert!(timing.delta < 0.05, "delta spike after resume: {}", timing.delta);
    }

    #[test]
    fn visibility_regain_while_running_is_ignored() {
        let mut scheduler = FrameScheduler::new();
        scheduler.set_visible(true);
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.begin_frame().is_some());
    }
}
