//! The runtime context: one clock plus the table of named values.
//!
//! Everything user code touches goes through a [`RuntimeContext`] passed by
//! reference, so redefining a named value is observed by every player that
//! reads it, without any process-wide state.

use crate::clock::{Clock, When};
use crate::error::TimeVarError;
use crate::types::timevar::{Span, TimeVar};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

pub struct RuntimeContext {
    clock: Clock,
    vars: RwLock<HashMap<String, TimeVar>>,
}

impl RuntimeContext {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            vars: RwLock::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Define `name` as a step value. An existing value is updated in place
    /// so every holder sees the new segments.
    pub fn define_var(
        &self,
        name: &str,
        values: Vec<f64>,
        durations: Vec<Span>,
    ) -> Result<TimeVar, TimeVarError> {
        let mut vars = self.vars.write();
        if let Some(existing) = vars.get(name) {
            existing.update(values, durations)?;
            debug!(var = name, "variable updated");
            return Ok(existing.clone());
        }
        let var = TimeVar::new(values, durations)?;
        vars.insert(name.to_string(), var.clone());
        debug!(var = name, "variable defined");
        Ok(var)
    }

    /// Bind `name` to any value (a ramp, a composition). An existing value
    /// takes over the new definition in place.
    pub fn assign_var(&self, name: &str, value: TimeVar) -> Result<TimeVar, TimeVarError> {
        let mut vars = self.vars.write();
        if let Some(existing) = vars.get(name) {
            existing.redefine(&value)?;
            debug!(var = name, "variable redefined");
            return Ok(existing.clone());
        }
        vars.insert(name.to_string(), value.clone());
        debug!(var = name, "variable defined");
        Ok(value)
    }

    pub fn var(&self, name: &str) -> Option<TimeVar> {
        self.vars.read().get(name).cloned()
    }

    /// Forget a name; holders keep their handle
    pub fn remove_var(&self, name: &str) -> Option<TimeVar> {
        self.vars.write().remove(name)
    }

    pub fn var_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Current value of a named variable at the clock's beat
    pub fn value(&self, name: &str) -> Option<f64> {
        self.var(name).map(|var| var.now(&self.clock))
    }

    /// Register a watcher on the clock
    pub fn when(&self, id: impl Into<String>, when: When) -> bool {
        self.clock.when(id, when)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualTime;
    use crate::types::clock_config::ClockConfig;

    fn context() -> RuntimeContext {
        RuntimeContext::new(
            Clock::with_source(ClockConfig::default(), VirtualTime::unlimited()).unwrap(),
        )
    }

    #[test]
    fn test_redefinition_reaches_every_holder() {
        let ctx = context();
        let held = ctx.define_var("x", vec![0.0, 3.0], vec![Span::beats(4)]).unwrap();
        let doubled = &held * 2.0;

        ctx.define_var("x", vec![5.0], vec![Span::beats(1)]).unwrap();
        assert_eq!(ctx.value("x"), Some(5.0));
        assert_eq!(doubled.now(ctx.clock()), 10.0);
        assert!(ctx.var("x").unwrap().same_as(&held));
    }

    #[test]
    fn test_value_follows_the_clock() {
        let ctx = context();
        ctx.define_var("x", vec![0.0, 3.0], vec![Span::beats(4)]).unwrap();
        assert_eq!(ctx.value("x"), Some(0.0));
        for _ in 0..16 {
            ctx.clock().tick();
        }
        assert_eq!(ctx.value("x"), Some(3.0));
    }

    #[test]
    fn test_assign_rejects_cycles() {
        let ctx = context();
        let x = ctx.define_var("x", vec![1.0], vec![Span::beats(1)]).unwrap();
        assert_eq!(
            ctx.assign_var("x", &x + 1.0).unwrap_err(),
            TimeVarError::DependencyCycle
        );
        let ramp = TimeVar::linear(vec![0.0, 1.0], vec![Span::beats(4)]).unwrap();
        ctx.assign_var("x", ramp).unwrap();
        assert_eq!(ctx.var_names(), vec!["x".to_string()]);
    }

    #[test]
    fn test_remove_var() {
        let ctx = context();
        let x = ctx.define_var("x", vec![1.0], vec![Span::beats(1)]).unwrap();
        assert!(ctx.remove_var("x").is_some());
        assert_eq!(ctx.value("x"), None);
        assert_eq!(x.value_at(crate::types::time::beats(0)), 1.0);
    }
}
