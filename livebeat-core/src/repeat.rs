//! Periodic method calls
//!
//! `every(4, "reverse")` on a player becomes a [`MethodCall`]: a bound
//! action that fires on the clock, then files itself again after the next
//! interval value. Each entity keeps its calls in a [`Repeats`] registry
//! keyed by method name, so calling `every` again for the same method
//! updates the existing call instead of adding a second one.

use crate::clock::{guarded, Clock, ScheduleKey, WeakClock};
use crate::error::RepeatError;
use crate::types::cycle::Cycle;
use crate::types::time::Time;
use num_traits::Signed;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of invoking a bound action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Done,
    /// The owner no longer exists; the call cancels itself
    Orphaned,
}

/// A method bound to its owner, called with this firing's arguments
pub type BoundAction = Box<dyn FnMut(&[f64]) -> anyhow::Result<Dispatch> + Send>;

/// Bind `f` to `owner` without keeping the owner alive
pub fn bind<T, F>(owner: &Arc<Mutex<T>>, mut f: F) -> BoundAction
where
    T: Send + 'static,
    F: FnMut(&mut T, &[f64]) -> anyhow::Result<()> + Send + 'static,
{
    let owner = Arc::downgrade(owner);
    Box::new(move |args| match owner.upgrade() {
        Some(owner) => {
            f(&mut owner.lock(), args)?;
            Ok(Dispatch::Done)
        }
        None => Ok(Dispatch::Orphaned),
    })
}

struct CallState {
    interval: Cycle<Time>,
    args: Vec<Cycle<f64>>,
    /// Taken out while the action runs
    action: Option<BoundAction>,
    /// Beat of the next firing
    next: Time,
    count: usize,
    entry: Option<ScheduleKey>,
    /// Bumped on every re-anchor so stale entries do nothing
    generation: u64,
}

/// One method invoked on a repeating schedule
pub struct MethodCall {
    name: String,
    state: Mutex<CallState>,
    cancelled: AtomicBool,
    clock: WeakClock,
}

impl MethodCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of completed firings since the last (re)anchor
    pub fn count(&self) -> usize {
        self.state.lock().count
    }

    /// Beat of the next firing
    pub fn next_fire(&self) -> Time {
        self.state.lock().next
    }

    pub fn interval(&self) -> Cycle<Time> {
        self.state.lock().interval.clone()
    }

    pub fn args(&self) -> Vec<Cycle<f64>> {
        self.state.lock().args.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_scheduled(&self) -> bool {
        !self.is_cancelled() && self.state.lock().entry.is_some()
    }

    /// Stop firing; the pending queue entry is removed
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let entry = self.state.lock().entry.take();
        if let (Some(key), Some(clock)) = (entry, self.clock.upgrade()) {
            clock.cancel(key);
        }
        debug!(method = %self.name, "method call cancelled");
    }

    /// Replace interval, arguments and action, and anchor the first firing
    /// at the next bar plus the first interval
    fn anchor(self: &Arc<Self>, clock: &Clock, interval: Cycle<Time>, args: Vec<Cycle<f64>>, action: BoundAction) {
        let stale = {
            let mut st = self.state.lock();
            st.next = clock.next_bar() + *interval.get(0);
            st.interval = interval;
            st.args = args;
            st.action = Some(action);
            st.count = 0;
            st.generation += 1;
            st.entry.take()
        };
        if let Some(key) = stale {
            clock.cancel(key);
        }
        self.cancelled.store(false, Ordering::SeqCst);
        self.arm(clock);
    }

    fn arm(self: &Arc<Self>, clock: &Clock) {
        let (at, generation) = {
            let st = self.state.lock();
            (st.next, st.generation)
        };
        let call = Arc::clone(self);
        let key = clock.schedule_soon(at, move |clock| {
            call.fire(clock, generation);
            Ok(())
        });
        let mut st = self.state.lock();
        if st.generation == generation {
            st.entry = Some(key);
        }
    }

    fn fire(self: &Arc<Self>, clock: &Clock, generation: u64) {
        let (args, action) = {
            let mut st = self.state.lock();
            if self.is_cancelled() || st.generation != generation {
                return;
            }
            st.entry = None;
            let count = st.count;
            let args: Vec<f64> = st.args.iter().map(|arg| *arg.get(count)).collect();
            (args, st.action.take())
        };

        let Some(mut action) = action else {
            return;
        };
        let outcome = guarded(|| action(&args));

        {
            let mut st = self.state.lock();
            if st.generation != generation {
                // Re-anchored while running; the new action stays
                return;
            }
            st.action = Some(action);
            st.count += 1;
            let step = *st.interval.get(st.count);
            st.next += step;
        }

        match outcome {
            Ok(Dispatch::Done) => {}
            Ok(Dispatch::Orphaned) => {
                warn!(method = %self.name, "owner is gone, cancelling method call");
                self.cancelled.store(true, Ordering::SeqCst);
                return;
            }
            Err(err) => warn!(method = %self.name, error = %err, "method call failed"),
        }

        if !self.is_cancelled() {
            self.arm(clock);
        }
    }
}

/// Method calls of one entity, keyed by method name
pub struct Repeats {
    clock: Clock,
    calls: HashMap<String, Arc<MethodCall>>,
}

impl Repeats {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            calls: HashMap::new(),
        }
    }

    /// Call `action` every `interval` beats, starting at the next bar plus
    /// the first interval. Re-registering a name updates that call in place
    /// and re-anchors it.
    pub fn every(
        &mut self,
        name: &str,
        interval: Cycle<Time>,
        args: Vec<Cycle<f64>>,
        action: BoundAction,
    ) -> Result<Arc<MethodCall>, RepeatError> {
        if let Some(bad) = interval.iter().find(|t| !t.is_positive()) {
            return Err(RepeatError::NonPositiveInterval(bad.to_string()));
        }

        let call = match self.calls.get(name) {
            Some(call) => {
                debug!(method = name, interval = %interval, "method call updated");
                Arc::clone(call)
            }
            None => {
                debug!(method = name, interval = %interval, "method call added");
                let call = Arc::new(MethodCall {
                    name: name.to_string(),
                    state: Mutex::new(CallState {
                        interval: interval.clone(),
                        args: Vec::new(),
                        action: None,
                        next: Time::from_integer(0),
                        count: 0,
                        entry: None,
                        generation: 0,
                    }),
                    cancelled: AtomicBool::new(false),
                    clock: self.clock.downgrade(),
                });
                self.calls.insert(name.to_string(), Arc::clone(&call));
                call
            }
        };
        call.anchor(&self.clock, interval, args, action);
        Ok(call)
    }

    /// Cancel the call for `name`. Returns whether one existed.
    pub fn never(&mut self, name: &str) -> bool {
        match self.calls.remove(name) {
            Some(call) => {
                call.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every call
    pub fn clear(&mut self) {
        for (_, call) in self.calls.drain() {
            call.cancel();
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MethodCall>> {
        self.calls.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.calls.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Drop for Repeats {
    fn drop(&mut self) {
        self.clear();
    }
}
