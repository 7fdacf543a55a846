//! A small session driven end to end through the public API: a pattern
//! player reading a shared value, a periodic method call and a watcher.

use livebeat_core::clock::{shared, Clock, Player, VirtualTime, When};
use livebeat_core::types::cycle::Cycle;
use livebeat_core::types::time::{beats, time, Time};
use livebeat_core::types::{expand, ClockConfig, Sequence, Span};
use livebeat_core::{bind, RuntimeContext, Repeats, TimeVar};
use parking_lot::Mutex;
use std::sync::Arc;

struct Drum {
    sequence: Sequence,
    index: usize,
    amp: TimeVar,
    current: Option<(char, f64)>,
    delay: Time,
    beat: Time,
    playing: bool,
    out: Arc<Mutex<Vec<(Time, char, f64)>>>,
}

impl Drum {
    fn reverse(&mut self) {
        self.sequence = self.sequence.reversed();
        self.index = 0;
    }
}

impl Player for Drum {
    fn name(&self) -> &str {
        "d1"
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn update_state(&mut self, clock: &Clock) -> anyhow::Result<()> {
        let step = self.sequence.get(self.index).cloned();
        self.index += 1;
        self.beat = clock.beat();
        // One pattern unit is one beat here
        self.delay = step.as_ref().map_or(beats(1), |s| s.duration);
        self.current = step
            .and_then(|s| s.char())
            .map(|c| (c, self.amp.now(clock)));
        Ok(())
    }

    fn send(&mut self) -> anyhow::Result<()> {
        if let Some((c, amp)) = self.current {
            if c != ' ' {
                self.out.lock().push((self.beat, c, amp));
            }
        }
        Ok(())
    }

    fn next_delay(&self) -> Time {
        self.delay
    }
}

fn session() -> RuntimeContext {
    let clock = Clock::with_source(ClockConfig::default(), VirtualTime::unlimited()).unwrap();
    RuntimeContext::new(clock)
}

fn run(ctx: &RuntimeContext, n: usize) {
    for _ in 0..n {
        ctx.clock().tick();
    }
}

#[test]
fn test_player_follows_pattern_and_shared_value() {
    let ctx = session();
    let amp = ctx.define_var("amp", vec![1.0, 0.5], vec![Span::beats(4)]).unwrap();
    let out = Arc::new(Mutex::new(Vec::new()));
    let drum = shared(Drum {
        sequence: expand("x-o[-o]").unwrap(),
        index: 0,
        amp,
        current: None,
        delay: beats(1),
        beat: beats(0),
        playing: false,
        out: Arc::clone(&out),
    });
    ctx.clock().play(drum.clone());

    // Starts on the bar at beat 0 and plays through two bars
    run(&ctx, 33);
    let events = out.lock().clone();
    let heard: String = events.iter().map(|(_, c, _)| *c).collect();
    assert_eq!(&heard[..10], "x-o-ox-o-o");
    assert_eq!(events[0], (beats(0), 'x', 1.0));
    assert_eq!(events[3], (time(3, 1), '-', 1.0));
    assert_eq!(events[4].0, time(7, 2));
    // The second bar reads the second value
    assert!(events
        .iter()
        .filter(|(t, _, _)| *t >= beats(4) && *t < beats(8))
        .all(|(_, _, a)| *a == 0.5));

    // Redefinition is seen by the running player
    ctx.define_var("amp", vec![0.25], vec![Span::beats(1)]).unwrap();
    run(&ctx, 4);
    assert_eq!(out.lock().last().map(|e| e.2), Some(0.25));
}

#[test]
fn test_method_call_reverses_player() {
    let ctx = session();
    let amp = TimeVar::constant(1.0);
    let out = Arc::new(Mutex::new(Vec::new()));
    let drum = shared(Drum {
        sequence: expand("xo").unwrap(),
        index: 0,
        amp,
        current: None,
        delay: beats(1),
        beat: beats(0),
        playing: false,
        out: Arc::clone(&out),
    });
    let mut repeats = Repeats::new(ctx.clock());
    let call = repeats
        .every(
            "reverse",
            Cycle::single(beats(4)),
            Vec::new(),
            bind(&drum, |d: &mut Drum, _| {
                d.reverse();
                Ok(())
            }),
        )
        .unwrap();
    assert_eq!(call.next_fire(), beats(8));

    run(&ctx, 33);
    assert_eq!(call.count(), 1);
    assert_eq!(call.next_fire(), beats(12));
    assert_eq!(drum.lock().sequence.symbol_string(), "ox");

    repeats.never("reverse");
    assert!(call.is_cancelled());
    assert_eq!(ctx.clock().scheduled(), 0);
}

#[test]
fn test_watcher_sees_value_transitions() {
    let ctx = session();
    let x = ctx.define_var("x", vec![0.0, 1.0], vec![Span::beats(2)]).unwrap();
    let flips = Arc::new(Mutex::new(Vec::new()));
    let on = Arc::clone(&flips);
    let off = Arc::clone(&flips);
    let watched = x.clone();
    ctx.when(
        "x-high",
        When::new(move |clock| Ok(watched.now(clock) > 0.5))
            .then(move |clock| {
                on.lock().push((true, clock.beat()));
                Ok(())
            })
            .otherwise(move |clock| {
                off.lock().push((false, clock.beat()));
                Ok(())
            }),
    );

    run(&ctx, 17);
    assert_eq!(
        *flips.lock(),
        vec![
            (false, beats(0)),
            (true, beats(2)),
            (false, beats(4)),
        ]
    );
}
