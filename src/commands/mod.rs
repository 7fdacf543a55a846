//! Command registry for REPL commands
//!
//! Every line typed at the prompt, read from a watched file or emitted by a
//! watcher action is matched against the registered prefixes, longest
//! first, and handed to its handler with the rest of the line.

pub mod clock;
pub mod general;
pub mod players;
pub mod vars;

use crate::player::SamplePlayer;
use crate::sink::Sink;
use anyhow::{anyhow, bail};
use crossbeam_channel::Sender;
use livebeat_core::clock::PlayerId;
use livebeat_core::types::cycle::Cycle;
use livebeat_core::types::time::{from_f64, time, Time};
use livebeat_core::types::Span;
use livebeat_core::RuntimeContext;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, nothing to show
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// No registered prefix matches
    NotACommand,
    Error(String),
    /// Watch a file and run it whenever it changes
    Watch(String),
    /// Run a file once
    Run(String),
}

/// A started player and the handle the clock knows it by
pub struct PlayerHandle {
    pub id: PlayerId,
    pub player: Arc<Mutex<SamplePlayer>>,
}

/// Context passed to command handlers
pub struct CommandContext {
    pub runtime: Arc<RuntimeContext>,
    pub sink: Arc<dyn Sink>,
    pub players: BTreeMap<String, PlayerHandle>,
    /// Commands queued by watcher actions, run by the REPL loop
    pub deferred: Sender<String>,
}

impl CommandContext {
    pub fn new(runtime: Arc<RuntimeContext>, sink: Arc<dyn Sink>, deferred: Sender<String>) -> Self {
        Self {
            runtime,
            sink,
            players: BTreeMap::new(),
            deferred,
        }
    }

    /// Drop handles of players the clock no longer knows (after `clear`)
    pub fn prune_players(&mut self) {
        let clock = self.runtime.clock().clone();
        self.players.retain(|_, handle| clock.player(handle.id).is_some());
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        let input = input.trim();
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Execute every non-empty line of a script that is not a `#` comment
    pub fn run_script(&self, script: &str, ctx: &mut CommandContext) -> Vec<(String, CommandResult)> {
        script
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| (line.to_string(), self.execute(line, ctx)))
            .collect()
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Clock
    registry.register("tempo", clock::cmd_tempo);
    registry.register("steps", clock::cmd_steps);
    registry.register("meter", clock::cmd_meter);
    registry.register("bars", clock::cmd_bars);
    registry.register("start", clock::cmd_start);
    registry.register("stop", clock::cmd_stop);
    registry.register("clear", clock::cmd_clear);
    registry.register("status", clock::cmd_status);

    // Players
    registry.register("play", players::cmd_play);
    registry.register("halt", players::cmd_halt);
    registry.register("players", players::cmd_players);
    registry.register("every", players::cmd_every);
    registry.register("never", players::cmd_never);

    // Values and watchers
    registry.register("var", vars::cmd_var);
    registry.register("print", vars::cmd_print);
    registry.register("vars", vars::cmd_vars);
    registry.register("when", vars::cmd_when);
    registry.register("unwhen", vars::cmd_unwhen);

    // General
    registry.register("run", general::cmd_run);
    registry.register("watch", general::cmd_watch);
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}

/// Split arguments on whitespace, keeping `"..."` strings and `[...]`
/// lists together. Quotes are removed; brackets are kept.
pub fn tokenize(args: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = args.chars();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '"' if depth == 0 => {
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => quoted.push(c),
                        None => bail!("unclosed quote"),
                    }
                }
                current.push_str(&quoted);
                tokens.push(std::mem::take(&mut current));
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("unexpected ']'"))?;
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }
    if depth > 0 {
        bail!("unclosed '['");
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// A beat count: `4`, `0.5` or `3/2`
pub fn parse_time(token: &str) -> anyhow::Result<Time> {
    if let Some((n, d)) = token.split_once('/') {
        let n: i64 = n.trim().parse().map_err(|_| anyhow!("invalid beats '{}'", token))?;
        let d: i64 = d.trim().parse().map_err(|_| anyhow!("invalid beats '{}'", token))?;
        if d == 0 {
            bail!("invalid beats '{}'", token);
        }
        return Ok(time(n, d));
    }
    let value: f64 = token.parse().map_err(|_| anyhow!("invalid beats '{}'", token))?;
    if !value.is_finite() {
        bail!("invalid beats '{}'", token);
    }
    Ok(from_f64(value))
}

pub fn parse_number(token: &str) -> anyhow::Result<f64> {
    token
        .parse()
        .map_err(|_| anyhow!("invalid number '{}'", token))
}

/// A single item or a `[a, b, ...]` list
pub fn parse_list<T>(token: &str, item: impl Fn(&str) -> anyhow::Result<T>) -> anyhow::Result<Vec<T>> {
    match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        Some(inner) => {
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(&item)
                .collect::<anyhow::Result<Vec<T>>>()?;
            if items.is_empty() {
                bail!("empty list '{}'", token);
            }
            Ok(items)
        }
        None => Ok(vec![item(token)?]),
    }
}

pub fn parse_cycle<T>(token: &str, item: impl Fn(&str) -> anyhow::Result<T>) -> anyhow::Result<Cycle<T>> {
    Cycle::new(parse_list(token, item)?).ok_or_else(|| anyhow!("empty list '{}'", token))
}

/// `inf` holds forever, anything else is a beat count
pub fn parse_span(token: &str) -> anyhow::Result<Span> {
    if token == "inf" {
        Ok(Span::Forever)
    } else {
        Ok(Span::Beats(parse_time(token)?))
    }
}

#[cfg(test)]
mod tests;
