//! General REPL commands (help, quit, watch, run)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `watch <file>` command
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    CommandResult::Watch(args.to_string())
}

/// Handle `run <file>` command
pub fn cmd_run(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: run <file>".to_string());
    }
    CommandResult::Run(args.to_string())
}

/// Print help information
fn print_help() {
    println!("{}", "Livebeat Help".bold());
    println!("{}", "=============".bold());
    println!();
    println!("{}", "Clock:".green());
    println!("  {}          - Show or set the tempo", "tempo [bpm]".cyan());
    println!("  {}            - Show or set steps per beat", "steps [n]".cyan());
    println!("  {}          - Show or set the time signature", "meter [3/4]".cyan());
    println!("  {}             - Show or set bars per queue cycle", "bars [n]".cyan());
    println!("  {}         - Start the clock / stop it and clear", "start | stop".cyan());
    println!("  {}                - Stop every player and watcher", "clear".cyan());
    println!("  {}               - Clock, players and watchers", "status".cyan());
    println!();
    println!("{}", "Players:".green());
    println!(
        "  {} - Play a pattern from the next bar",
        "play d1 \"x-o[-o]\" dur=1/2 amp=0.8".cyan()
    );
    println!("  {}             - Stop a player", "halt d1".cyan());
    println!("  {}             - List players and their repeats", "players".cyan());
    println!(
        "  {}  - Call a method every 4 beats (reverse, rotate, shuffle, dur)",
        "every d1 4 reverse".cyan()
    );
    println!("  {}  - Call a method on alternating intervals", "every d1 [3,1] rotate 2".cyan());
    println!("  {}     - Cancel a repeating method", "never d1 reverse".cyan());
    println!();
    println!("{}", "Patterns:".green());
    println!("  {}    - Sub-divide one step", "[xo]".cyan());
    println!("  {}    - Alternate each time round", "(xo)".cyan());
    println!("  {}    - Pick one at random each time", "{xo}".cyan());
    println!("  {}    - Play layers together", "<x-><oo>".cyan());
    println!("  Space and '.' are rests; quote patterns that contain spaces.");
    println!();
    println!("{}", "Values:".green());
    println!("  {}          - Step through values every 4 beats", "var x [0,3] 4".cyan());
    println!("  {}   - Hold the last value for ever", "var x [0,3] [4,inf]".cyan());
    println!("  {}      - Ramp (lin, sin or exp)", "var x lin [0,1] 8".cyan());
    println!("  {}        - Follow another value", "var y = x * 2".cyan());
    println!("  {} / {}      - Current value / all values", "print x".cyan(), "vars".cyan());
    println!(
        "  {} - Run commands when a comparison flips",
        "when hi x > 1 then tempo 140 else tempo 120".cyan()
    );
    println!("  {}            - Remove a watcher", "unwhen hi".cyan());
    println!();
    println!("{}", "Files:".green());
    println!("  {}         - Run each line of a file", "run set.lb".cyan());
    println!("  {}       - Re-run a file whenever it changes", "watch set.lb".cyan());
    println!("  Lines starting with '#' are comments.");
    println!();
    println!("{}", "Other:".green());
    println!("  {}           - Show this help", "help".cyan());
    println!("  {}    - Exit", "quit or exit".cyan());
}
