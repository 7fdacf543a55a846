//! Watchers ("when statements"): a test checked on a step grid, with
//! actions fired when its result flips.

use super::Clock;
use crate::types::time::{time, Time};
use std::fmt;

pub(crate) type Test = Box<dyn FnMut(&Clock) -> anyhow::Result<bool> + Send>;
pub(crate) type Action = Box<dyn FnMut(&Clock) -> anyhow::Result<()> + Send>;

/// Default check interval in beats
pub fn default_step() -> Time {
    time(1, 4)
}

/// A test and the actions to run when it becomes true or false.
///
/// The first evaluation always fires the matching action; after that an
/// action only fires on a transition.
pub struct When {
    test: Test,
    then: Option<Action>,
    otherwise: Option<Action>,
    step: Time,
}

impl When {
    pub fn new<F>(test: F) -> Self
    where
        F: FnMut(&Clock) -> anyhow::Result<bool> + Send + 'static,
    {
        Self {
            test: Box::new(test),
            then: None,
            otherwise: None,
            step: default_step(),
        }
    }

    /// Run `action` when the test turns true
    pub fn then<F>(mut self, action: F) -> Self
    where
        F: FnMut(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        self.then = Some(Box::new(action));
        self
    }

    /// Run `action` when the test turns false
    pub fn otherwise<F>(mut self, action: F) -> Self
    where
        F: FnMut(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        self.otherwise = Some(Box::new(action));
        self
    }

    /// Check every `step` beats instead of every quarter beat
    pub fn every(mut self, step: Time) -> Self {
        self.step = step;
        self
    }

    pub fn step(&self) -> Time {
        self.step
    }

    /// Evaluate the test and fire the action for a changed result.
    /// Returns the new result.
    pub(crate) fn evaluate(&mut self, clock: &Clock, last: Option<bool>) -> anyhow::Result<bool> {
        let state = (self.test)(clock)?;
        if last != Some(state) {
            let action = if state {
                self.then.as_mut()
            } else {
                self.otherwise.as_mut()
            };
            if let Some(action) = action {
                action(clock)?;
            }
        }
        Ok(state)
    }
}

impl fmt::Debug for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When")
            .field("step", &self.step)
            .field("then", &self.then.is_some())
            .field("otherwise", &self.otherwise.is_some())
            .finish()
    }
}
