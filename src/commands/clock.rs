//! Clock commands (tempo, steps, meter, bars, start, stop, clear, status)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use livebeat_core::types::time::to_f64;
use livebeat_core::types::Meter;

/// Handle `tempo [bpm]` command
pub fn cmd_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.runtime.clock();
    if args.is_empty() {
        return CommandResult::Message(format!("Current tempo: {:.1} BPM", clock.bpm()));
    }
    let Ok(bpm) = args.parse::<f64>() else {
        return CommandResult::Error(format!("Invalid tempo '{}'", args));
    };
    match clock.change_tempo(bpm) {
        Ok(()) => CommandResult::Message(
            format!("Tempo set to {:.1} BPM", bpm)
                .bright_green()
                .to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `steps [n]` command
pub fn cmd_steps(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.runtime.clock();
    if args.is_empty() {
        return CommandResult::Message(format!("{} steps per beat", clock.steps_per_beat()));
    }
    let Ok(steps) = args.parse::<u32>() else {
        return CommandResult::Error(format!("Invalid step count '{}'", args));
    };
    match clock.change_steps(steps) {
        Ok(()) => CommandResult::Message(
            format!("Grid set to {} steps per beat", steps)
                .bright_green()
                .to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `meter [n/d]` command
pub fn cmd_meter(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.runtime.clock();
    if args.is_empty() {
        return CommandResult::Message(format!("Meter: {}", clock.meter()));
    }
    let meter = match args.parse::<Meter>() {
        Ok(meter) => meter,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    match clock.change_time_signature(meter.numerator, meter.denominator) {
        Ok(()) => CommandResult::Message(format!("Meter set to {}", meter).bright_green().to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `bars [n]` command
pub fn cmd_bars(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.runtime.clock();
    if args.is_empty() {
        return CommandResult::Message(format!("Cycle length: {} bar(s)", clock.config().bars));
    }
    let Ok(bars) = args.parse::<u32>() else {
        return CommandResult::Error(format!("Invalid bar count '{}'", args));
    };
    match clock.change_bars(bars) {
        Ok(()) => CommandResult::Message(
            format!("Cycle length set to {} bar(s)", bars)
                .bright_green()
                .to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `start` command
pub fn cmd_start(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let clock = ctx.runtime.clock();
    if clock.is_running() {
        return CommandResult::Message("Clock already running".to_string());
    }
    clock.start();
    CommandResult::Message("Clock started".bright_green().to_string())
}

/// Handle `stop` command: halts the clock and clears everything
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.runtime.clock().stop();
    ctx.players.clear();
    CommandResult::Message("Clock stopped".bright_yellow().to_string())
}

/// Handle `clear` command: stops every player and watcher, keeps ticking
pub fn cmd_clear(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.runtime.clock().clear();
    ctx.players.clear();
    CommandResult::Message("Cleared".bright_yellow().to_string())
}

/// Handle `status` command
pub fn cmd_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.prune_players();
    let clock = ctx.runtime.clock();
    let config = clock.config();
    let state = if clock.is_running() {
        "running".bright_green()
    } else {
        "stopped".bright_red()
    };
    let mut out = format!(
        "Clock {}: {:.1} BPM, {} x {} bar(s), {} steps per beat\n",
        state, config.bpm, config.meter, config.bars, config.steps_per_beat
    );
    out.push_str(&format!(
        "Beat {:.2} (slot {}/{}), {} scheduled\n",
        to_f64(clock.beat()),
        clock.now(),
        clock.queue_len(),
        clock.scheduled()
    ));
    out.push_str(&format!(
        "{} player(s), {} watcher(s), {} variable(s)",
        ctx.players.len(),
        clock.watcher_ids().len(),
        ctx.runtime.var_names().len()
    ));
    CommandResult::Message(out)
}
