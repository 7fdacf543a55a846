//! A sample-style player: walks an expanded pattern and emits one event per
//! sounding step.

use crate::sink::{Event, Sink};
use anyhow::{anyhow, bail};
use livebeat_core::clock::{Clock, Player};
use livebeat_core::repeat::{bind, MethodCall};
use livebeat_core::types::cycle::Cycle;
use livebeat_core::types::time::{from_f64, time, Time};
use livebeat_core::types::{Sequence, Step, Symbol};
use livebeat_core::{Repeats, TimeVar};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Base duration of one pattern unit, in beats
pub fn default_dur() -> Time {
    time(1, 2)
}

/// Methods that can be called on a repeating schedule
pub const METHODS: &[&str] = &["reverse", "rotate", "shuffle", "dur"];

/// A player parameter: a number, or a value read at the clock's beat
#[derive(Clone)]
pub enum Param {
    Fixed(f64),
    Var(TimeVar),
}

impl Param {
    pub fn value(&self, clock: &Clock) -> f64 {
        match self {
            Param::Fixed(value) => *value,
            Param::Var(var) => var.now(clock),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Fixed(value) => write!(f, "{}", value),
            Param::Var(var) => write!(f, "{}", var),
        }
    }
}

pub struct SamplePlayer {
    name: String,
    sequence: Sequence,
    dur: Time,
    params: BTreeMap<String, Param>,
    sink: Arc<dyn Sink>,
    rng: StdRng,
    /// Index of the next pattern step
    index: usize,
    /// Resolved sub-steps of a choice still to play
    pending: VecDeque<Step>,
    current: Option<Event>,
    delay: Time,
    playing: bool,
    repeats: Repeats,
}

impl SamplePlayer {
    pub fn new(name: &str, sequence: Sequence, clock: &Clock, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.to_string(),
            sequence,
            dur: default_dur(),
            params: BTreeMap::new(),
            sink,
            rng: StdRng::from_entropy(),
            index: 0,
            pending: VecDeque::new(),
            current: None,
            delay: default_dur(),
            playing: false,
            repeats: Repeats::new(clock),
        }
    }

    /// Use a fixed seed for choices and shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Swap in a new pattern, continuing from the same step index
    pub fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
        self.pending.clear();
    }

    pub fn dur(&self) -> Time {
        self.dur
    }

    pub fn set_dur(&mut self, dur: Time) -> anyhow::Result<()> {
        if dur <= Time::from_integer(0) {
            bail!("duration must be positive, got {}", dur);
        }
        self.dur = dur;
        Ok(())
    }

    pub fn set_param(&mut self, name: &str, param: Param) {
        self.params.insert(name.to_string(), param);
    }

    pub fn params(&self) -> &BTreeMap<String, Param> {
        &self.params
    }

    pub fn reverse(&mut self) {
        self.sequence = self.sequence.reversed();
    }

    pub fn rotate(&mut self, n: i64) {
        self.sequence = self.sequence.rotated(n);
    }

    pub fn shuffle(&mut self) {
        let mut steps = self.sequence.steps().to_vec();
        steps.shuffle(&mut self.rng);
        self.sequence = self.sequence.with_steps(steps);
    }

    /// Run one of [`METHODS`] with its arguments
    pub fn call(&mut self, method: &str, args: &[f64]) -> anyhow::Result<()> {
        match method {
            "reverse" => self.reverse(),
            "rotate" => self.rotate(args.first().map_or(1, |n| *n as i64)),
            "shuffle" => self.shuffle(),
            "dur" => {
                let beats = args
                    .first()
                    .ok_or_else(|| anyhow!("dur needs a duration"))?;
                self.set_dur(from_f64(*beats))?;
            }
            other => bail!("unknown method '{}'", other),
        }
        debug!(player = %self.name, method, "method called");
        Ok(())
    }

    /// Call `method` on `player` every `interval` beats. Calling it again
    /// for the same method replaces the schedule.
    pub fn every(
        player: &Arc<Mutex<SamplePlayer>>,
        method: &str,
        interval: Cycle<Time>,
        args: Vec<Cycle<f64>>,
    ) -> anyhow::Result<Arc<MethodCall>> {
        if !METHODS.contains(&method) {
            bail!("unknown method '{}' (available: {})", method, METHODS.join(", "));
        }
        let name = method.to_string();
        let action = bind(player, move |p: &mut SamplePlayer, args| p.call(&name, args));
        Ok(player.lock().repeats.every(method, interval, args, action)?)
    }

    pub fn never(&mut self, method: &str) -> bool {
        self.repeats.never(method)
    }

    pub fn methods(&self) -> Vec<String> {
        self.repeats.names()
    }

    pub fn method(&self, name: &str) -> Option<Arc<MethodCall>> {
        self.repeats.get(name).cloned()
    }

    fn next_step(&mut self) -> Option<Step> {
        if let Some(step) = self.pending.pop_front() {
            return Some(step);
        }
        let step = self.sequence.get(self.index)?.clone();
        self.index = self.index.wrapping_add(1);
        if let Symbol::Choice(_) = step.symbol {
            let resolved = step.resolve(&mut self.rng);
            if resolved.is_empty() {
                return Some(Step::new(Symbol::Char(' '), step.duration));
            }
            self.pending.extend(resolved);
            return self.pending.pop_front();
        }
        Some(step)
    }
}

impl Player for SamplePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
        self.index = 0;
        self.pending.clear();
    }

    fn stop(&mut self) {
        self.playing = false;
        self.current = None;
        self.repeats.clear();
    }

    fn update_state(&mut self, clock: &Clock) -> anyhow::Result<()> {
        let Some(step) = self.next_step() else {
            self.current = None;
            self.delay = self.dur;
            return Ok(());
        };
        self.delay = step.duration * self.dur;
        self.current = match step.char() {
            Some(symbol) if !step.is_rest() => Some(Event {
                player: self.name.clone(),
                beat: clock.beat(),
                symbol,
                duration: self.delay,
                params: self
                    .params
                    .iter()
                    .map(|(name, param)| (name.clone(), param.value(clock)))
                    .collect(),
            }),
            _ => None,
        };
        Ok(())
    }

    fn send(&mut self) -> anyhow::Result<()> {
        match self.current.take() {
            Some(event) => self.sink.emit(&event),
            None => Ok(()),
        }
    }

    fn next_delay(&self) -> Time {
        self.delay
    }
}

impl fmt::Display for SamplePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} dur={}", self.name, self.sequence, self.dur)?;
        for (name, param) in &self.params {
            write!(f, " {}={}", name, param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use livebeat_core::clock::{shared, VirtualTime};
    use livebeat_core::types::expand;
    use livebeat_core::types::time::beats;
    use livebeat_core::{ClockConfig, Span};

    fn clock() -> Clock {
        Clock::with_source(ClockConfig::default(), VirtualTime::unlimited()).unwrap()
    }

    fn ticks(clock: &Clock, n: usize) {
        for _ in 0..n {
            clock.tick();
        }
    }

    fn player(clock: &Clock, notation: &str, sink: &Arc<MemorySink>) -> Arc<Mutex<SamplePlayer>> {
        let sink: Arc<dyn Sink> = sink.clone();
        shared(SamplePlayer::new("d1", expand(notation).unwrap(), clock, sink).with_seed(7))
    }

    #[test]
    fn test_plays_at_base_duration() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        let p = player(&clock, "x-o[-o]", &sink);
        clock.play(p.clone());

        // Two repeats of a 4-unit pattern at half a beat each
        ticks(&clock, 16);
        assert_eq!(sink.symbols(), "x-o-ox-o-o");
        let beats: Vec<Time> = sink.events().iter().map(|e| e.beat).collect();
        assert_eq!(beats[..5], [time(0, 1), time(1, 2), time(1, 1), time(3, 2), time(7, 4)]);
        assert_eq!(sink.events()[4].duration, time(1, 4));
    }

    #[test]
    fn test_rests_are_silent() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        clock.play(player(&clock, "x x.", &sink));
        ticks(&clock, 16);
        assert_eq!(sink.symbols(), "xxxx");
    }

    #[test]
    fn test_choices_resolve_to_one_option() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        clock.play(player(&clock, "{x[oo]}", &sink));
        ticks(&clock, 40);
        let events = sink.events();
        assert!(!events.is_empty());
        // Each option keeps its own subdivision of the step
        for event in &events {
            match event.symbol {
                'x' => assert_eq!(event.duration, time(1, 2)),
                'o' => assert_eq!(event.duration, time(1, 4)),
                other => panic!("unexpected symbol {:?}", other),
            }
        }
    }

    #[test]
    fn test_params_read_at_the_beat() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        let p = player(&clock, "x", &sink);
        let amp = TimeVar::new(vec![1.0, 0.0], vec![Span::beats(1)]).unwrap();
        p.lock().set_param("amp", Param::Var(amp));
        p.lock().set_param("pan", Param::Fixed(-1.0));
        clock.play(p.clone());

        ticks(&clock, 8);
        let amps: Vec<f64> = sink.events().iter().map(|e| e.params["amp"]).collect();
        assert_eq!(amps, vec![1.0, 1.0, 0.0, 0.0]);
        assert!(sink.events().iter().all(|e| e.params["pan"] == -1.0));
    }

    #[test]
    fn test_methods() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        let p = player(&clock, "abcd", &sink);
        let mut p = p.lock();
        p.call("reverse", &[]).unwrap();
        assert_eq!(p.sequence().symbol_string(), "dcba");
        p.call("rotate", &[]).unwrap();
        assert_eq!(p.sequence().symbol_string(), "cbad");
        p.call("rotate", &[-2.0]).unwrap();
        assert_eq!(p.sequence().symbol_string(), "adcb");
        p.call("dur", &[0.25]).unwrap();
        assert_eq!(p.dur(), time(1, 4));
        assert!(p.call("dur", &[]).is_err());
        assert!(p.call("dur", &[0.0]).is_err());
        assert!(p.call("explode", &[]).is_err());

        p.call("shuffle", &[]).unwrap();
        let mut symbols: Vec<char> = p.sequence().symbols();
        symbols.sort();
        assert_eq!(symbols, vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn test_every_and_stop() {
        let clock = clock();
        let sink = Arc::new(MemorySink::new());
        let p = player(&clock, "ab", &sink);
        let call = SamplePlayer::every(&p, "reverse", Cycle::single(beats(2)), Vec::new()).unwrap();
        assert_eq!(call.next_fire(), beats(6));
        assert!(SamplePlayer::every(&p, "explode", Cycle::single(beats(2)), Vec::new()).is_err());
        assert!(SamplePlayer::every(&p, "rotate", Cycle::single(beats(0)), Vec::new()).is_err());

        let id = clock.play(p.clone());
        ticks(&clock, 25);
        assert_eq!(call.count(), 1);
        assert_eq!(p.lock().sequence().symbol_string(), "ba");

        clock.stop_player(id);
        assert!(call.is_cancelled());
        assert!(p.lock().methods().is_empty());
        assert_eq!(clock.scheduled(), 0);
    }
}
