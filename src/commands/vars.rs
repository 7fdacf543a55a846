//! Time-varying values and watchers (var, print, vars, when, unwhen)

use crate::commands::{
    parse_list, parse_number, parse_span, tokenize, CommandContext, CommandResult,
};
use anyhow::{anyhow, bail};
use colored::*;
use livebeat_core::clock::When;
use livebeat_core::types::timevar::{BinOp, Operand};
use livebeat_core::{RuntimeContext, TimeVar};

/// Handle `var` in its three forms:
///
/// - `var <name> <values> <durations>`: step value, e.g. `var x [0,3] 4`
/// - `var <name> lin|sin|exp <values> <durations>`: ramp
/// - `var <name> = <a> <op> <b>`: composition of names and numbers
pub fn cmd_var(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match define(args, &ctx.runtime) {
        Ok(var) => CommandResult::Message(var),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn define(args: &str, runtime: &RuntimeContext) -> anyhow::Result<String> {
    let tokens = tokenize(args)?;
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let var = match tokens.as_slice() {
        [name, "=", left, op, right] => {
            let op = op
                .chars()
                .next()
                .filter(|_| op.len() == 1)
                .and_then(BinOp::from_symbol)
                .ok_or_else(|| anyhow!("unknown operator '{}'", op))?;
            let composed = TimeVar::compose(operand(left, runtime)?, op, operand(right, runtime)?);
            runtime.assign_var(name, composed)?
        }
        [name, curve @ ("lin" | "sin" | "exp"), values, durations] => {
            let values = parse_list(values, parse_number)?;
            let durations = parse_list(durations, parse_span)?;
            let ramp = match *curve {
                "lin" => TimeVar::linear(values, durations)?,
                "sin" => TimeVar::sine(values, durations)?,
                _ => TimeVar::exponential(values, durations)?,
            };
            runtime.assign_var(name, ramp)?
        }
        [name, values, durations] => {
            let values = parse_list(values, parse_number)?;
            let durations = parse_list(durations, parse_span)?;
            runtime.define_var(name, values, durations)?
        }
        _ => bail!("Usage: var <name> [lin|sin|exp] <values> <durations> | var <name> = <a> <op> <b>"),
    };
    Ok(format!("{} = {}", tokens[0].bright_cyan(), var))
}

fn operand(token: &str, runtime: &RuntimeContext) -> anyhow::Result<Operand> {
    if let Ok(number) = token.parse::<f64>() {
        return Ok(Operand::Const(number));
    }
    runtime
        .var(token)
        .map(Operand::Var)
        .ok_or_else(|| anyhow!("unknown variable '{}'", token))
}

/// Handle `print <name>` command
pub fn cmd_print(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.runtime.value(args) {
        Some(value) => CommandResult::Message(format!("{} = {}", args, value)),
        None => CommandResult::Error(format!("unknown variable '{}'", args)),
    }
}

/// Handle `vars` command
pub fn cmd_vars(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let names = ctx.runtime.var_names();
    if names.is_empty() {
        return CommandResult::Message("No variables".to_string());
    }
    let clock = ctx.runtime.clock();
    let lines: Vec<String> = names
        .iter()
        .filter_map(|name| ctx.runtime.var(name).map(|var| (name, var)))
        .map(|(name, var)| format!("  {} = {} (now {})", name.bright_cyan(), var, var.now(clock)))
        .collect();
    CommandResult::Message(lines.join("\n"))
}

#[derive(Clone, Copy)]
enum Comparison {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            ">" => Comparison::Gt,
            "<" => Comparison::Lt,
            ">=" => Comparison::Ge,
            "<=" => Comparison::Le,
            "==" => Comparison::Eq,
            "!=" => Comparison::Ne,
            _ => return None,
        })
    }

    fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Comparison::Gt => a > b,
            Comparison::Lt => a < b,
            Comparison::Ge => a >= b,
            Comparison::Le => a <= b,
            Comparison::Eq => a == b,
            Comparison::Ne => a != b,
        }
    }
}

/// Handle `when <id> <var> <cmp> <number> then <command> [else <command>]`
///
/// The commands are queued for the REPL loop when the comparison flips.
pub fn cmd_when(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match when(args, ctx) {
        Ok(message) => CommandResult::Message(message),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn when(args: &str, ctx: &mut CommandContext) -> anyhow::Result<String> {
    const USAGE: &str = "Usage: when <id> <var> <cmp> <number> then <command> [else <command>]";
    let (condition, actions) = args.split_once(" then ").ok_or_else(|| anyhow!(USAGE))?;
    let (then, otherwise) = match actions.split_once(" else ") {
        Some((then, otherwise)) => (then.trim().to_string(), Some(otherwise.trim().to_string())),
        None => (actions.trim().to_string(), None),
    };
    let parts: Vec<&str> = condition.split_whitespace().collect();
    let [id, name, cmp, threshold] = parts.as_slice() else {
        bail!(USAGE);
    };
    let cmp = Comparison::parse(cmp).ok_or_else(|| anyhow!("unknown comparison '{}'", cmp))?;
    let threshold = parse_number(threshold)?;
    let var = ctx
        .runtime
        .var(name)
        .ok_or_else(|| anyhow!("unknown variable '{}'", name))?;
    if then.is_empty() {
        bail!(USAGE);
    }

    let mut watcher = When::new(move |clock| Ok(cmp.holds(var.now(clock), threshold)));
    let queue = ctx.deferred.clone();
    watcher = watcher.then(move |_| Ok(queue.send(then.clone())?));
    if let Some(otherwise) = otherwise {
        let queue = ctx.deferred.clone();
        watcher = watcher.otherwise(move |_| Ok(queue.send(otherwise.clone())?));
    }

    let replaced = ctx.runtime.when(*id, watcher);
    Ok(if replaced {
        format!("Watcher '{}' updated", id)
    } else {
        format!("Watcher '{}' added", id)
    })
}

/// Handle `unwhen <id>` command
pub fn cmd_unwhen(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if ctx.runtime.clock().remove_when(args) {
        CommandResult::Message(format!("Watcher '{}' removed", args))
    } else {
        CommandResult::Error(format!("No watcher named '{}'", args))
    }
}
