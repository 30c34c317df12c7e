//! Fixed-timestep clock
//!
//! The viewer renders at whatever rate the display allows while the world
//! advances in fixed control steps. [`SimClock`] accumulates wall time and
//! reports how many steps are due.

use std::time::Duration;

/// Upper bound on steps taken in a single frame
///
/// After a long stall (window drag, breakpoint) the clock drops the backlog
/// instead of trying to catch up.
pub const MAX_STEPS_PER_FRAME: u32 = 8;

/// Accumulates wall time into fixed simulation steps
#[derive(Clone, Debug)]
pub struct SimClock {
    step: f64,
    accumulator: f64,
    /// Simulated time advanced so far, in seconds
    elapsed: f64,
    paused: bool,
}

impl SimClock {
    /// Create a clock for the given step length in seconds
    pub fn new(step: f32) -> Self {
        Self {
            step: f64::from(step.max(f32::EPSILON)),
            accumulator: 0.0,
            elapsed: 0.0,
            paused: false,
        }
    }

    /// Feed wall time; returns the number of steps to run now
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.paused {
            return 0;
        }
        self.accumulator += dt.as_secs_f64();

        let due = (self.accumulator / self.step).floor();
        let steps = (due as u32).min(MAX_STEPS_PER_FRAME);
        if due as u32 > MAX_STEPS_PER_FRAME {
            log::trace!("Dropping {} overdue steps", due as u32 - MAX_STEPS_PER_FRAME);
            self.accumulator = 0.0;
        } else {
            self.accumulator -= f64::from(steps) * self.step;
        }
        self.elapsed += f64::from(steps) * self.step;
        steps
    }

    /// Fraction of a step left in the accumulator, in [0, 1)
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step) as f32
    }

    /// Simulated seconds handed out so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume; pausing discards any partial step
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.accumulator = 0.0;
        }
    }

    /// Toggle pause, returning the new state
    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// Forget accumulated and elapsed time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_steps() {
        let mut clock = SimClock::new(0.01);
        assert_eq!(clock.advance(Duration::from_millis(35)), 3);
        assert!((clock.alpha() - 0.5).abs() < 1e-3);
        assert_eq!(clock.advance(Duration::from_millis(5)), 1);
        assert!((clock.elapsed() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_backlog_is_capped() {
        let mut clock = SimClock::new(0.002);
        assert_eq!(clock.advance(Duration::from_secs(1)), MAX_STEPS_PER_FRAME);
        assert_eq!(clock.alpha(), 0.0);
    }

    #[test]
    fn test_pause() {
        let mut clock = SimClock::new(0.01);
        assert!(clock.toggle_pause());
        assert_eq!(clock.advance(Duration::from_millis(100)), 0);
        assert!(!clock.toggle_pause());
        assert_eq!(clock.advance(Duration::from_millis(20)), 2);
    }

    #[test]
    fn test_reset() {
        let mut clock = SimClock::new(0.01);
        clock.advance(Duration::from_millis(25));
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.alpha(), 0.0);
    }
}
