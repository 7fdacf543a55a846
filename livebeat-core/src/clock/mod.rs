//! Beat-synchronous clock
//!
//! The clock owns a ring of step slots (`steps_per_beat * beats_per_bar *
//! bars` of them). Every tick it:
//!
//! 1. evaluates the watchers whose step grid lands on the current step,
//! 2. starts queued players when the step is a bar boundary,
//! 3. fires the callables due in the current slot, then the players,
//! 4. advances the position and applies any parameter change made during
//!    the tick.
//!
//! Nothing that runs inside a tick can stop the clock: errors and panics
//! are logged and the offending item is dropped (watchers) or retried on
//! its next turn (players).

mod player;
mod queue;
mod source;
mod when;

pub use player::{shared, Player, PlayerId, SharedPlayer};
pub use queue::ScheduleKey;
pub use source::{ClockSignal, SystemTime, TimeSource, VirtualTime};
pub use when::{default_step, When};

use crate::error::ClockError;
use crate::types::clock_config::{ClockConfig, Meter};
use crate::types::time::{beats, from_f64, from_steps, to_f64, to_steps, Time};
use crate::types::timevar::BeatSource;
use anyhow::anyhow;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use queue::{Entry, Queue, Task};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, info, warn};

struct Watcher {
    id: String,
    step: Time,
    /// Result of the previous evaluation
    last: Option<bool>,
    when: Arc<Mutex<When>>,
}

struct ClockState {
    config: ClockConfig,
    /// Parameter change requested during a tick
    pending: Option<ClockConfig>,
    /// Absolute step; the next one to fire
    position: u64,
    queue: Queue,
    watchers: Vec<Watcher>,
    players: HashMap<PlayerId, SharedPlayer>,
    /// Players waiting for the next bar boundary
    queued: Vec<(PlayerId, SharedPlayer)>,
    in_tick: bool,
    /// The current slot has already been emptied this tick
    drained: bool,
    /// Keys cancelled while their entry was being fired
    cancelled: HashSet<ScheduleKey>,
    /// Bumped by `clear()` so in-flight entries are not re-filed
    generation: u64,
    next_id: u64,
}

impl ClockState {
    fn new(config: ClockConfig) -> Self {
        Self {
            config,
            pending: None,
            position: 0,
            queue: Queue::new(config.queue_len()),
            watchers: Vec::new(),
            players: HashMap::new(),
            queued: Vec::new(),
            in_tick: false,
            drained: false,
            cancelled: HashSet::new(),
            generation: 0,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// First step that can still fire
    fn horizon(&self) -> u64 {
        self.position + self.drained as u64
    }

    /// File a task for an absolute beat. A beat already gone is re-aimed at
    /// the next time the cycle reaches the same slot.
    fn file(&mut self, key: ScheduleKey, at: Time, task: Task) {
        let at = at.max(Time::from_integer(0));
        let horizon = self.horizon();
        let mut step = to_steps(at, self.config.steps_per_beat) as u64;
        let mut at = at;
        if step < horizon {
            let len = self.queue.len() as u64;
            let cycles = (horizon - step + len - 1) / len;
            step += cycles * len;
            at += beats((cycles * self.config.beats() as u64) as i64);
        }
        self.queue.push(Entry { key, at, step, task });
    }

    /// File a recurring task again; it fires no earlier than the next step.
    /// A beat that falls before that step takes the step's beat.
    fn refile(&mut self, key: ScheduleKey, at: Time, task: Task) {
        let steps = self.config.steps_per_beat;
        let horizon = self.horizon();
        let step = to_steps(at, steps).max(0) as u64;
        if step < horizon {
            let at = from_steps(horizon, steps);
            self.queue.push(Entry { key, at, step: horizon, task });
        } else {
            self.queue.push(Entry { key, at, step, task });
        }
    }

    fn apply_config(&mut self, config: ClockConfig) {
        let old = std::mem::replace(&mut self.config, config);
        if old.steps_per_beat == config.steps_per_beat && old.beats() == config.beats() {
            if old.bpm != config.bpm {
                info!(bpm = config.bpm, "tempo changed");
            }
            if old.meter != config.meter {
                info!(meter = %config.meter, "time signature changed");
            }
            return;
        }

        let steps = config.steps_per_beat;
        let beat = from_steps(self.position, old.steps_per_beat);
        if old.steps_per_beat != steps {
            // Same beat on the new grid
            self.position = to_steps(beat, steps).max(0) as u64;
        }

        // Pending entries keep their phase, measured from the start of the
        // cycle the current beat falls in. The beat counter itself stays put.
        let old_cycle = beats(old.beats() as i64);
        let new_cycle = beats(config.beats() as i64);
        let old_start = (beat / old_cycle).floor() * old_cycle;
        let new_start = (beat / new_cycle).floor() * new_cycle;

        let entries = self.queue.rebuild(config.queue_len());
        let moved = entries.len();
        for entry in entries {
            if old_cycle == new_cycle {
                let step = (to_steps(entry.at, steps).max(0) as u64).max(self.position);
                self.queue.push(Entry { step, ..entry });
                continue;
            }
            let offset = entry.at - old_start;
            let cycles = (offset / old_cycle).floor();
            let phase = (offset - cycles * old_cycle) / old_cycle;
            let at = new_start + cycles * new_cycle + phase * new_cycle;
            self.file(entry.key, at, entry.task);
        }

        info!(
            bpm = config.bpm,
            meter = %config.meter,
            bars = config.bars,
            steps,
            queue_len = config.queue_len(),
            "clock reconfigured"
        );
        debug!(entries = moved, position = self.position, "queue rebuilt");
    }
}

struct Runner {
    handle: JoinHandle<()>,
    signals: Sender<ClockSignal>,
    thread: ThreadId,
}

struct Shared {
    state: Mutex<ClockState>,
    /// Serializes whole ticks
    tick_lock: Mutex<()>,
    source: Arc<dyn TimeSource>,
    running: AtomicBool,
    run_id: AtomicU64,
    runner: Mutex<Option<Runner>>,
}

/// Cheap, clonable handle to a shared clock
#[derive(Clone)]
pub struct Clock {
    shared: Arc<Shared>,
}

/// Non-owning handle, for things the clock itself keeps alive
#[derive(Clone)]
pub struct WeakClock {
    shared: Weak<Shared>,
}

impl WeakClock {
    pub fn upgrade(&self) -> Option<Clock> {
        self.shared.upgrade().map(|shared| Clock { shared })
    }
}

impl fmt::Debug for WeakClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakClock")
    }
}

/// Run `f`, turning a panic into an error
pub(crate) fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow!("panicked: {}", message))
        }
    }
}

fn interval_steps(step: Time, steps_per_beat: u32) -> u64 {
    to_steps(step, steps_per_beat).max(1) as u64
}

impl Clock {
    /// A clock paced by the system clock
    pub fn new(config: ClockConfig) -> Result<Self, ClockError> {
        Self::with_source(config, SystemTime::new())
    }

    /// A clock paced by any [`TimeSource`]
    pub fn with_source<S: TimeSource>(config: ClockConfig, source: S) -> Result<Self, ClockError> {
        config.validate()?;
        Ok(Self::build(config, Arc::new(source)))
    }

    fn build(config: ClockConfig, source: Arc<dyn TimeSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ClockState::new(config)),
                tick_lock: Mutex::new(()),
                source,
                running: AtomicBool::new(false),
                run_id: AtomicU64::new(0),
                runner: Mutex::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakClock {
        WeakClock {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Same underlying clock
    pub fn same_as(&self, other: &Clock) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.shared.state.lock()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Begin ticking on a dedicated thread. Does nothing if already running.
    pub fn start(&self) {
        let mut runner = self.shared.runner.lock();
        if self.is_running() {
            return;
        }
        if let Some(old) = runner.take() {
            if old.thread != thread::current().id() {
                let _ = old.handle.join();
            }
        }

        self.shared.source.restart();
        self.shared.running.store(true, Ordering::SeqCst);
        let run_id = self.shared.run_id.fetch_add(1, Ordering::SeqCst) + 1;

        let (signals, receiver) = bounded(1);
        let weak = self.downgrade();
        let source = Arc::clone(&self.shared.source);
        let spawned = thread::Builder::new()
            .name("livebeat-clock".to_string())
            .spawn(move || run(weak, source, receiver, run_id));

        match spawned {
            Ok(handle) => {
                *runner = Some(Runner {
                    thread: handle.thread().id(),
                    handle,
                    signals,
                });
                info!(bpm = self.bpm(), "clock started");
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                warn!(error = %err, "failed to spawn clock thread");
            }
        }
    }

    /// Halt ticking and clear everything (see [`clear`](Clock::clear)).
    pub fn stop(&self) {
        let runner = self.shared.runner.lock().take();
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(runner) = runner {
            let _ = runner.signals.try_send(ClockSignal::Stop);
            // A stop issued from a tick lets the thread wind down on its own
            if runner.thread != thread::current().id() {
                let _ = runner.handle.join();
            }
        }
        self.clear();
        info!("clock stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Stop every player, drop every watcher and scheduled call, and reset
    /// the position to zero. The clock keeps running if it was.
    pub fn clear(&self) {
        let stopping: Vec<SharedPlayer> = {
            let mut st = self.state();
            st.queue.clear();
            st.watchers.clear();
            st.cancelled.clear();
            st.position = 0;
            st.generation += 1;
            let mut players: Vec<SharedPlayer> = st.players.drain().map(|(_, p)| p).collect();
            players.extend(st.queued.drain(..).map(|(_, p)| p));
            players
        };
        for player in &stopping {
            player.lock().stop();
        }
        info!(players = stopping.len(), "clock cleared");
    }

    // ---------------------------------------------------------------------
    // Ticking
    // ---------------------------------------------------------------------

    /// Process the current step and advance by one.
    ///
    /// The clock thread calls this once per step interval; tests call it
    /// directly to step through time without sleeping.
    pub fn tick(&self) {
        let _ticking = self.shared.tick_lock.lock();

        let (position, generation, watchers) = {
            let mut st = self.state();
            st.in_tick = true;
            st.drained = false;
            let position = st.position;
            let steps = st.config.steps_per_beat;
            let watchers: Vec<(String, Option<bool>, Arc<Mutex<When>>)> = st
                .watchers
                .iter()
                .filter(|w| position % interval_steps(w.step, steps) == 0)
                .map(|w| (w.id.clone(), w.last, Arc::clone(&w.when)))
                .collect();
            (position, st.generation, watchers)
        };

        self.run_watchers(watchers);
        self.start_queued(position);

        let due = {
            let mut st = self.state();
            st.drained = true;
            st.queue.take_due(position)
        };
        let (players, calls): (Vec<Entry>, Vec<Entry>) =
            due.into_iter().partition(|entry| entry.task.is_player());
        for entry in calls.into_iter().chain(players) {
            self.fire(entry, generation);
        }

        let mut st = self.state();
        if st.generation == generation {
            st.position += 1;
        }
        st.in_tick = false;
        st.drained = false;
        st.cancelled.clear();
        if let Some(config) = st.pending.take() {
            st.apply_config(config);
        }
    }

    fn run_watchers(&self, due: Vec<(String, Option<bool>, Arc<Mutex<When>>)>) {
        for (id, last, when) in due {
            let outcome = guarded(|| when.lock().evaluate(self, last));
            let mut st = self.state();
            match outcome {
                Ok(state) => {
                    if let Some(watcher) = st.watchers.iter_mut().find(|w| w.id == id) {
                        watcher.last = Some(state);
                    }
                }
                Err(err) => {
                    warn!(watcher = %id, error = %err, "watcher failed, removing it");
                    st.watchers
                        .retain(|w| !(w.id == id && Arc::ptr_eq(&w.when, &when)));
                }
            }
        }
    }

    fn start_queued(&self, position: u64) {
        let starting = {
            let mut st = self.state();
            if st.queued.is_empty() || position % st.config.bar_steps() != 0 {
                return;
            }
            std::mem::take(&mut st.queued)
        };

        for (_, player) in &starting {
            player.lock().play();
        }

        let mut st = self.state();
        let at = from_steps(position, st.config.steps_per_beat);
        for (id, player) in starting {
            debug!(player = %id, "player started");
            st.players.insert(id, player);
            let key = ScheduleKey(st.next_id());
            st.queue.push(Entry {
                key,
                at,
                step: position,
                task: Task::Player(id),
            });
        }
    }

    fn fire(&self, entry: Entry, generation: u64) {
        let Entry { key, at, task, .. } = entry;
        match task {
            Task::Call(call) => {
                if let Err(err) = guarded(|| call(self)) {
                    warn!(key = %key, error = %err, "scheduled call failed");
                }
            }
            Task::Repeat { interval, mut action } => {
                if let Err(err) = guarded(|| action(self)) {
                    warn!(key = %key, error = %err, "recurring call failed");
                }
                let mut st = self.state();
                if st.generation == generation && !st.cancelled.remove(&key) {
                    st.refile(key, at + interval, Task::Repeat { interval, action });
                }
            }
            Task::Player(id) => {
                let Some(player) = self.state().players.get(&id).cloned() else {
                    debug!(player = %id, "dropping entry for a removed player");
                    return;
                };

                let delay = {
                    let mut player = player.lock();
                    if !player.is_playing() {
                        debug!(player = %id, "dropping entry for a stopped player");
                        return;
                    }
                    let result = guarded(|| {
                        player.update_state(self)?;
                        player.send()
                    });
                    if let Err(err) = result {
                        warn!(player = %id, name = player.name(), error = %err, "player update failed");
                    }
                    player.next_delay()
                };

                let mut st = self.state();
                if st.generation == generation && st.players.contains_key(&id) {
                    let delay = if delay > Time::from_integer(0) {
                        delay
                    } else {
                        from_steps(1, st.config.steps_per_beat)
                    };
                    st.refile(key, at + delay, Task::Player(id));
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------------

    /// Run `f` once at the absolute beat `at`. A beat already passed is
    /// moved to the next time the cycle reaches the same slot.
    pub fn schedule<F>(&self, at: Time, f: F) -> ScheduleKey
    where
        F: FnOnce(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        let mut st = self.state();
        let key = ScheduleKey(st.next_id());
        st.file(key, at, Task::Call(Box::new(f)));
        debug!(key = %key, at = %at, "scheduled");
        key
    }

    /// Like [`schedule`](Clock::schedule), but a beat already gone fires on
    /// the next step instead of a cycle later. Used by self-rescheduling
    /// calls.
    pub(crate) fn schedule_soon<F>(&self, at: Time, f: F) -> ScheduleKey
    where
        F: FnOnce(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        let mut st = self.state();
        let key = ScheduleKey(st.next_id());
        st.refile(key, at, Task::Call(Box::new(f)));
        key
    }

    /// Run `f` once, `ahead` beats from now
    pub fn future<F>(&self, ahead: Time, f: F) -> ScheduleKey
    where
        F: FnOnce(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        self.schedule(self.beat() + ahead, f)
    }

    /// Run `f` every `interval` beats, starting one interval from now
    pub fn every<F>(&self, interval: Time, f: F) -> ScheduleKey
    where
        F: FnMut(&Clock) -> anyhow::Result<()> + Send + 'static,
    {
        let mut st = self.state();
        let key = ScheduleKey(st.next_id());
        let at = from_steps(st.position, st.config.steps_per_beat) + interval;
        st.file(
            key,
            at,
            Task::Repeat {
                interval,
                action: Box::new(f),
            },
        );
        debug!(key = %key, interval = %interval, "recurring call scheduled");
        key
    }

    /// Remove a scheduled call. Returns whether it was waiting in the queue.
    pub fn cancel(&self, key: ScheduleKey) -> bool {
        let mut st = self.state();
        let removed = st.queue.remove(key);
        if !removed && st.in_tick {
            st.cancelled.insert(key);
        }
        removed
    }

    pub fn is_scheduled(&self, key: ScheduleKey) -> bool {
        self.state().queue.contains(key)
    }

    /// Register a watcher under `id`. An existing watcher with the same id
    /// takes the new test and actions (keeping its last result); returns
    /// whether one existed.
    pub fn when(&self, id: impl Into<String>, when: When) -> bool {
        let id = id.into();
        let mut st = self.state();
        let step = when.step();
        let when = Arc::new(Mutex::new(when));
        if let Some(watcher) = st.watchers.iter_mut().find(|w| w.id == id) {
            watcher.step = step;
            watcher.when = when;
            debug!(watcher = %id, "watcher updated");
            true
        } else {
            debug!(watcher = %id, "watcher added");
            st.watchers.push(Watcher {
                id,
                step,
                last: None,
                when,
            });
            false
        }
    }

    pub fn remove_when(&self, id: &str) -> bool {
        let mut st = self.state();
        let before = st.watchers.len();
        st.watchers.retain(|w| w.id != id);
        st.watchers.len() != before
    }

    pub fn watcher_ids(&self) -> Vec<String> {
        self.state().watchers.iter().map(|w| w.id.clone()).collect()
    }

    // ---------------------------------------------------------------------
    // Players
    // ---------------------------------------------------------------------

    /// Register a player; it starts on the next bar boundary
    pub fn play(&self, player: SharedPlayer) -> PlayerId {
        let mut st = self.state();
        let id = PlayerId(st.next_id());
        st.queued.push((id, player));
        debug!(player = %id, "player queued for the next bar");
        id
    }

    /// Stop and unregister a player. Returns whether it was known.
    pub fn stop_player(&self, id: PlayerId) -> bool {
        let player = {
            let mut st = self.state();
            st.queue.remove_player(id);
            match st.players.remove(&id) {
                Some(player) => Some(player),
                None => st
                    .queued
                    .iter()
                    .position(|(queued, _)| *queued == id)
                    .map(|index| st.queued.remove(index).1),
            }
        };
        match player {
            Some(player) => {
                player.lock().stop();
                debug!(player = %id, "player stopped");
                true
            }
            None => false,
        }
    }

    /// Started players
    pub fn players(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.state().players.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Players waiting for the next bar
    pub fn queued_players(&self) -> Vec<PlayerId> {
        self.state().queued.iter().map(|(id, _)| *id).collect()
    }

    pub fn player(&self, id: PlayerId) -> Option<SharedPlayer> {
        let st = self.state();
        st.players.get(&id).cloned().or_else(|| {
            st.queued
                .iter()
                .find(|(queued, _)| *queued == id)
                .map(|(_, p)| Arc::clone(p))
        })
    }

    // ---------------------------------------------------------------------
    // Parameters
    // ---------------------------------------------------------------------

    /// Apply a parameter change: immediately outside a tick, at the end of
    /// the tick otherwise. Changes stack on earlier deferred ones.
    fn reconfigure(&self, change: impl FnOnce(&mut ClockConfig)) -> Result<(), ClockError> {
        let mut st = self.state();
        let mut config = st.pending.unwrap_or(st.config);
        change(&mut config);
        config.validate()?;
        if st.in_tick {
            debug!("parameter change deferred to the end of the tick");
            st.pending = Some(config);
        } else {
            st.apply_config(config);
        }
        Ok(())
    }

    pub fn configure(&self, config: ClockConfig) -> Result<(), ClockError> {
        self.reconfigure(|current| *current = config)
    }

    pub fn change_tempo(&self, bpm: f64) -> Result<(), ClockError> {
        self.reconfigure(|config| config.bpm = bpm)
    }

    pub fn change_steps(&self, steps_per_beat: u32) -> Result<(), ClockError> {
        self.reconfigure(|config| config.steps_per_beat = steps_per_beat)
    }

    pub fn change_time_signature(&self, numerator: u32, denominator: u32) -> Result<(), ClockError> {
        self.reconfigure(|config| config.meter = Meter::new(numerator, denominator))
    }

    pub fn change_bars(&self, bars: u32) -> Result<(), ClockError> {
        self.reconfigure(|config| config.bars = bars)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn config(&self) -> ClockConfig {
        self.state().config
    }

    pub fn bpm(&self) -> f64 {
        self.state().config.bpm
    }

    pub fn meter(&self) -> Meter {
        self.state().config.meter
    }

    pub fn steps_per_beat(&self) -> u32 {
        self.state().config.steps_per_beat
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    /// Absolute step counter
    pub fn position(&self) -> u64 {
        self.state().position
    }

    /// Position within the queue cycle, always in `[0, queue_len)`
    pub fn now(&self) -> u64 {
        let st = self.state();
        st.position % st.queue.len() as u64
    }

    /// Absolute beat of the current position
    pub fn beat(&self) -> Time {
        let st = self.state();
        from_steps(st.position, st.config.steps_per_beat)
    }

    /// Beats in one bar
    pub fn bar_length(&self) -> Time {
        beats(self.state().config.beats_per_bar() as i64)
    }

    /// First bar boundary strictly after the current beat
    pub fn next_bar(&self) -> Time {
        let beat = self.beat();
        let bar = self.bar_length();
        (beat / bar).floor() * bar + bar
    }

    /// Seconds per beat
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm()
    }

    /// Wall-clock time between ticks
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(self.state().config.step_secs())
    }

    pub fn beats_to_seconds(&self, beats: Time) -> f64 {
        to_f64(beats) * self.beat_duration()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> Time {
        from_f64(seconds / self.beat_duration())
    }

    /// Number of entries waiting in the queue
    pub fn scheduled(&self) -> usize {
        self.state().queue.count()
    }

    /// Due steps of everything in the queue, ascending
    pub fn scheduled_steps(&self) -> Vec<u64> {
        self.state().queue.due_steps()
    }

    pub fn slot_len(&self, slot: usize) -> usize {
        self.state().queue.slot_len(slot)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::build(ClockConfig::default(), Arc::new(SystemTime::new()))
    }
}

impl BeatSource for Clock {
    fn beat(&self) -> Time {
        Clock::beat(self)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state();
        f.debug_struct("Clock")
            .field("bpm", &st.config.bpm)
            .field("meter", &st.config.meter)
            .field("position", &st.position)
            .field("scheduled", &st.queue.count())
            .field("watchers", &st.watchers.len())
            .field("players", &st.players.len())
            .finish()
    }
}

/// Clock thread body
fn run(weak: WeakClock, source: Arc<dyn TimeSource>, signals: Receiver<ClockSignal>, run_id: u64) {
    loop {
        let Some(clock) = weak.upgrade() else {
            break;
        };
        if !clock.is_running() || clock.shared.run_id.load(Ordering::SeqCst) != run_id {
            break;
        }
        clock.tick();
        let interval = clock.step_duration();
        drop(clock);

        if !source.wait(interval, &signals) {
            break;
        }
    }

    if let Some(clock) = weak.upgrade() {
        if clock.shared.run_id.load(Ordering::SeqCst) == run_id {
            clock.shared.running.store(false, Ordering::SeqCst);
        }
    }
    debug!("clock thread exited");
}
