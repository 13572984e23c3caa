//! Frame clock for the animation loop.
//!
//! Tracks elapsed and delta time with pause support. Resuming restarts the
//! delta baseline, so a long pause (or a hidden window) never shows up as
//! one giant simulated step.

use std::time::{Duration, Instant};

/// Wall-clock time tracking for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    pause_elapsed: Duration,
}

impl FrameClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Advance the clock. Call once per frame.
    ///
    /// Returns `(elapsed, delta)` in seconds. While paused both delta and
    /// elapsed hold still.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed_secs = (now.duration_since(self.start) - self.pause_elapsed).as_secs_f32();
        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Seconds since start, excluding paused intervals.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Ticks since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop time. Subsequent ticks report zero delta.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause.
    ///
    /// The paused interval is subtracted from elapsed time and the delta
    /// baseline restarts from now.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Flip between paused and running.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tick_advances() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.tick();
        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_paused_delta_is_zero() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.pause();

        let elapsed_before = clock.elapsed();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.tick();
        assert_eq!(delta, 0.0);
        assert_eq!(elapsed, elapsed_before);
    }

    #[test]
    fn test_resume_skips_paused_interval() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.pause();
        thread::sleep(Duration::from_millis(50));
        clock.resume();

        let (_, delta) = clock.tick();
        // The 50ms pause must not appear in the first delta after resume.
        assert!(delta < 0.05);
    }

    #[test]
    fn test_toggle() {
        let mut clock = FrameClock::new();
        clock.toggle_pause();
        assert!(clock.is_paused());
        clock.toggle_pause();
        assert!(!clock.is_paused());
    }
}
