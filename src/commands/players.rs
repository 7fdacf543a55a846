//! Player commands (play, halt, players, every, never)

use crate::commands::{
    parse_cycle, parse_number, parse_time, tokenize, CommandContext, CommandResult, PlayerHandle,
};
use crate::player::{Param, SamplePlayer, METHODS};
use anyhow::{anyhow, bail};
use colored::*;
use livebeat_core::clock::shared;
use livebeat_core::types::expand;
use livebeat_core::types::time::to_f64;

/// Handle `play <name> <pattern> [dur=<beats>] [<param>=<number|var>...]`
///
/// Playing an existing name swaps its pattern and parameters in place.
pub fn cmd_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match play(args, ctx) {
        Ok(message) => CommandResult::Message(message),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn play(args: &str, ctx: &mut CommandContext) -> anyhow::Result<String> {
    let tokens = tokenize(args)?;
    let [name, notation, params @ ..] = tokens.as_slice() else {
        bail!("Usage: play <name> <pattern> [dur=<beats>] [<param>=<value>...]");
    };
    let sequence = expand(notation)?;

    let mut dur = None;
    let mut values = Vec::new();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <param>=<value>, got '{}'", param))?;
        if key == "dur" {
            dur = Some(parse_time(value)?);
            continue;
        }
        let value = match value.parse::<f64>() {
            Ok(number) => Param::Fixed(number),
            Err(_) => Param::Var(
                ctx.runtime
                    .var(value)
                    .ok_or_else(|| anyhow!("unknown variable '{}'", value))?,
            ),
        };
        values.push((key.to_string(), value));
    }

    ctx.prune_players();
    let clock = ctx.runtime.clock().clone();
    if let Some(handle) = ctx.players.get(name.as_str()) {
        let mut player = handle.player.lock();
        if let Some(dur) = dur {
            player.set_dur(dur)?;
        }
        player.set_sequence(sequence);
        for (key, value) in values {
            player.set_param(&key, value);
        }
        return Ok(format!("Updated {}", player));
    }

    let mut player = SamplePlayer::new(name, sequence, &clock, ctx.sink.clone());
    if let Some(dur) = dur {
        player.set_dur(dur)?;
    }
    for (key, value) in values {
        player.set_param(&key, value);
    }
    let message = format!(
        "{} {} (starts at beat {})",
        "Playing".bright_green(),
        player,
        to_f64(clock.next_bar())
    );
    let player = shared(player);
    let id = clock.play(player.clone());
    ctx.players.insert(name.to_string(), PlayerHandle { id, player });
    Ok(message)
}

/// Handle `halt <name>` command
pub fn cmd_halt(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: halt <name>".to_string());
    }
    match ctx.players.remove(args) {
        Some(handle) => {
            ctx.runtime.clock().stop_player(handle.id);
            CommandResult::Message(format!("Stopped {}", args))
        }
        None => CommandResult::Error(format!("No player named '{}'", args)),
    }
}

/// Handle `players` command
pub fn cmd_players(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.prune_players();
    if ctx.players.is_empty() {
        return CommandResult::Message("No players".to_string());
    }
    let queued = ctx.runtime.clock().queued_players();
    let mut out = format!("Players ({}):", ctx.players.len());
    for handle in ctx.players.values() {
        let player = handle.player.lock();
        let state = if queued.contains(&handle.id) {
            "queued".yellow()
        } else {
            "playing".bright_green()
        };
        out.push_str(&format!("\n  {} [{}]", player, state));
        for method in player.methods() {
            if let Some(call) = player.method(&method) {
                out.push_str(&format!(
                    "\n    every {} {} (next at beat {})",
                    call.interval(),
                    method,
                    to_f64(call.next_fire())
                ));
            }
        }
    }
    CommandResult::Message(out)
}

/// Handle `every <name> <beats|[beats,...]> <method> [args...]`
pub fn cmd_every(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match every(args, ctx) {
        Ok(message) => CommandResult::Message(message),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn every(args: &str, ctx: &mut CommandContext) -> anyhow::Result<String> {
    let tokens = tokenize(args)?;
    let [name, interval, method, rest @ ..] = tokens.as_slice() else {
        bail!(
            "Usage: every <name> <beats> <method> [args...] (methods: {})",
            METHODS.join(", ")
        );
    };
    let handle = ctx
        .players
        .get(name.as_str())
        .ok_or_else(|| anyhow!("No player named '{}'", name))?;
    let interval = parse_cycle(interval, parse_time)?;
    let args = rest
        .iter()
        .map(|arg| parse_cycle(arg, parse_number))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let call = SamplePlayer::every(&handle.player, method, interval, args)?;
    Ok(format!(
        "{}.{} every {} beat(s), first at beat {}",
        name,
        method,
        call.interval(),
        to_f64(call.next_fire())
    ))
}

/// Handle `never <name> <method>` command
pub fn cmd_never(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some((name, method)) = args.split_once(' ') else {
        return CommandResult::Error("Usage: never <name> <method>".to_string());
    };
    let Some(handle) = ctx.players.get(name) else {
        return CommandResult::Error(format!("No player named '{}'", name));
    };
    if handle.player.lock().never(method.trim()) {
        CommandResult::Message(format!("{}.{} cancelled", name, method.trim()))
    } else {
        CommandResult::Error(format!("{} has no repeating '{}'", name, method.trim()))
    }
}
