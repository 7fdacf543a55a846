//! Tests for the command registry and handlers.

use super::*;
use crate::sink::MemorySink;
use crossbeam_channel::{unbounded, Receiver};
use livebeat_core::clock::{Clock, VirtualTime};
use livebeat_core::types::time::{beats, time};
use livebeat_core::ClockConfig;

struct Session {
    registry: CommandRegistry,
    ctx: CommandContext,
    sink: Arc<MemorySink>,
    deferred: Receiver<String>,
}

impl Session {
    fn new() -> Self {
        let clock = Clock::with_source(ClockConfig::default(), VirtualTime::unlimited()).unwrap();
        let sink = Arc::new(MemorySink::new());
        let (tx, rx) = unbounded();
        let ctx = CommandContext::new(Arc::new(RuntimeContext::new(clock)), sink.clone(), tx);
        Self {
            registry: create_registry(),
            ctx,
            sink,
            deferred: rx,
        }
    }

    fn run(&mut self, line: &str) -> CommandResult {
        self.registry.execute(line, &mut self.ctx)
    }

    fn ok(&mut self, line: &str) -> String {
        match self.run(line) {
            CommandResult::Message(message) => message,
            other => panic!("'{}' gave {:?}", line, other),
        }
    }

    fn err(&mut self, line: &str) -> String {
        match self.run(line) {
            CommandResult::Error(message) => message,
            other => panic!("'{}' should fail, gave {:?}", line, other),
        }
    }

    fn clock(&self) -> &Clock {
        self.ctx.runtime.clock()
    }

    fn ticks(&self, n: usize) {
        for _ in 0..n {
            self.clock().tick();
        }
    }
}

#[test]
fn test_longest_prefix_wins() {
    let mut s = Session::new();
    // "players" must not be taken for "play" with argument "rs"
    assert_eq!(s.ok("players"), "No players");
    s.ok("var x [1] 1");
    // "vars" must not be taken for "var s"
    assert!(s.ok("vars").contains("x"));
    assert_eq!(s.run("explode now"), CommandResult::NotACommand);
    assert_eq!(s.run("quit"), CommandResult::Exit);
    assert_eq!(s.run("exit"), CommandResult::Exit);
    assert_eq!(s.run("watch set.lb"), CommandResult::Watch("set.lb".to_string()));
    assert_eq!(s.run("run set.lb"), CommandResult::Run("set.lb".to_string()));
    assert!(s.registry.list_commands().contains(&"unwhen"));
}

#[test]
fn test_tokenize() {
    assert_eq!(
        tokenize(r#"d1 "x o  xo " dur=1/2"#).unwrap(),
        vec!["d1", "x o  xo ", "dur=1/2"]
    );
    assert_eq!(tokenize("x [0, 3] [4, inf]").unwrap(), vec!["x", "[0,3]", "[4,inf]"]);
    assert_eq!(tokenize("d1 x-o[-o]").unwrap(), vec!["d1", "x-o[-o]"]);
    assert!(tokenize("\"open").is_err());
    assert!(tokenize("[1, 2").is_err());
    assert!(tokenize("1]").is_err());
}

#[test]
fn test_parse_helpers() {
    assert_eq!(parse_time("3/2").unwrap(), time(3, 2));
    assert_eq!(parse_time("0.25").unwrap(), time(1, 4));
    assert!(parse_time("1/0").is_err());
    assert!(parse_time("soon").is_err());
    assert_eq!(parse_list("[1,2]", parse_number).unwrap(), vec![1.0, 2.0]);
    assert_eq!(parse_list("7", parse_number).unwrap(), vec![7.0]);
    assert!(parse_list("[]", parse_number).is_err());
    assert_eq!(parse_span("inf").unwrap(), Span::Forever);
    assert_eq!(parse_span("4").unwrap(), Span::Beats(beats(4)));
}

#[test]
fn test_clock_commands() {
    let mut s = Session::new();
    assert_eq!(s.ok("tempo"), "Current tempo: 120.0 BPM");
    s.ok("tempo 140");
    assert_eq!(s.clock().bpm(), 140.0);
    assert!(s.err("tempo -3").contains("tempo"));
    assert!(s.err("tempo fast").contains("Invalid"));

    s.ok("steps 3");
    s.ok("meter 3/4");
    s.ok("bars 2");
    assert_eq!(s.clock().queue_len(), 18);
    assert!(s.err("meter 3/0").contains("3/0"));
    s.err("bars 0");
    s.err("steps 0");
    assert_eq!(s.ok("meter"), "Meter: 3/4");

    let status = s.ok("status");
    assert!(status.contains("140.0 BPM"));
    assert!(status.contains("3/4 x 2 bar(s)"));
}

#[test]
fn test_play_and_update_in_place() {
    let mut s = Session::new();
    s.ok("var amp [1,0.5] 2");
    s.ok("play d1 \"xo\" dur=1 amp=amp pan=0.5");
    assert_eq!(s.clock().queued_players().len(), 1);

    s.ticks(16);
    assert_eq!(s.sink.symbols(), "xoxo");
    let amps: Vec<f64> = s.sink.events().iter().map(|e| e.params["amp"]).collect();
    assert_eq!(amps, vec![1.0, 1.0, 0.5, 0.5]);

    // Same name swaps the pattern without a second player
    s.sink.clear();
    s.ok("play d1 ab");
    s.ticks(8);
    assert_eq!(s.clock().players().len(), 1);
    assert_eq!(s.sink.symbols(), "ab");

    assert!(s.err("play d2 \"[x\"").contains("unclosed"));
    assert!(s.err("play d2 x amp=nothing").contains("nothing"));
    s.err("play d2");

    assert!(s.ok("players").contains("d1"));
    s.ok("halt d1");
    assert!(s.clock().players().is_empty());
    s.err("halt d1");
}

#[test]
fn test_every_and_never() {
    let mut s = Session::new();
    s.ok("play d1 ab dur=1");
    let message = s.ok("every d1 [2,1] rotate 1");
    assert!(message.contains("first at beat 6"));
    s.err("every d1 2 explode");
    s.err("every d9 2 reverse");
    s.err("every d1 0 reverse");

    s.ticks(25);
    let player = s.ctx.players["d1"].player.clone();
    assert_eq!(player.lock().sequence().symbol_string(), "ba");
    assert!(s.ok("players").contains("every [2, 1] rotate"));

    s.ok("never d1 rotate");
    s.err("never d1 rotate");
    assert!(player.lock().methods().is_empty());
}

#[test]
fn test_vars() {
    let mut s = Session::new();
    s.ok("var x [0,3] 4");
    s.ok("var y = x * 2");
    s.ok("var z lin [0,1] [4]");
    assert_eq!(s.ok("print y"), "y = 0");
    s.ticks(16);
    assert_eq!(s.ok("print y"), "y = 6");

    // Redefining x is seen through y
    s.ok("var x [5] 1");
    assert_eq!(s.ok("print y"), "y = 10");

    assert!(s.err("var x = x + 1").contains("depend on itself"));
    assert!(s.err("var w = nope + 1").contains("nope"));
    s.err("var w = x % 1");
    s.err("var w [] 4");
    s.err("var w [1] 0");
    s.err("print nope");
    assert_eq!(s.ctx.runtime.var_names(), vec!["x", "y", "z"]);
}

#[test]
fn test_when_queues_commands() {
    let mut s = Session::new();
    s.ok("var x [0,1] 2");
    s.ok("when hi x > 0.5 then tempo 140 else tempo 120");
    s.err("when hi x ~ 1 then tempo 1");
    s.err("when hi nope > 1 then tempo 1");
    s.err("when hi x > 1");

    s.ticks(9);
    let queued: Vec<String> = s.deferred.try_iter().collect();
    assert_eq!(queued, vec!["tempo 120", "tempo 140"]);

    s.ok("unwhen hi");
    s.err("unwhen hi");
}

#[test]
fn test_clear_forgets_players() {
    let mut s = Session::new();
    s.ok("play d1 x");
    s.ok("var one [1] 1");
    s.ok("when hi one > 0 then tempo 1");
    s.ok("clear");
    assert!(s.ctx.players.is_empty());
    assert!(s.clock().watcher_ids().is_empty());
    assert_eq!(s.ok("players"), "No players");
}

#[test]
fn test_run_script() {
    let mut s = Session::new();
    let script = "# set\n\ntempo 100\nvar x [1] 1\nexplode\n";
    let results = s.registry.run_script(script, &mut s.ctx);
    assert_eq!(results.len(), 3);
    assert_eq!(results[2], ("explode".to_string(), CommandResult::NotACommand));
    assert_eq!(s.clock().bpm(), 100.0);
}
