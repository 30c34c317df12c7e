//! Loop termination
//!
//! The simulation loop runs until the window closes. Setting the `TESTING`
//! environment variable (to any value) bounds it: the loop stops after the
//! step in which the counter first exceeds `run.test_steps`, so the default
//! of 100 gives exactly 101 steps.

use crate::config::RunConfig;

/// Environment variable that bounds the loop for automated runs
pub const TESTING_VAR: &str = "TESTING";

/// Decides when the step loop ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    testing: bool,
    test_steps: u64,
    max_steps: Option<u64>,
}

impl StepBudget {
    /// A budget that never stops the loop
    pub fn unbounded() -> Self {
        Self {
            testing: false,
            test_steps: 0,
            max_steps: None,
        }
    }

    /// Budget from the run configuration, without looking at the environment
    pub fn new(run: &RunConfig) -> Self {
        Self {
            testing: false,
            test_steps: run.test_steps,
            max_steps: run.max_steps,
        }
    }

    /// Budget from the run configuration and the `TESTING` variable
    pub fn from_env(run: &RunConfig) -> Self {
        let testing = std::env::var_os(TESTING_VAR).is_some();
        if testing {
            log::info!(
                "{} is set; stopping after step {}",
                TESTING_VAR,
                run.test_steps + 1
            );
        }
        Self::new(run).with_testing(testing)
    }

    /// Turn the testing bound on or off
    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    /// Whether the testing bound is active
    pub fn is_testing(&self) -> bool {
        self.testing
    }

    /// Whether the loop will end on its own
    pub fn is_bounded(&self) -> bool {
        self.testing || self.max_steps.is_some()
    }

    /// Check the counter after a completed step
    pub fn should_stop(&self, t: u64) -> bool {
        (self.testing && t > self.test_steps) || self.max_steps.is_some_and(|max| t >= max)
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}
