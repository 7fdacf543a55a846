use anyhow::Context;
use clap::Parser;
use livebeat::config::{Overrides, Settings};
use livebeat::{ConsoleSink, Repl};
use livebeat_core::clock::Clock;
use livebeat_core::types::Meter;
use livebeat_core::RuntimeContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Live-coding music runtime with a beat-synchronous scheduler
#[derive(Parser, Debug)]
#[command(name = "livebeat", version, about)]
struct Args {
    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tempo in beats per minute
    #[arg(long)]
    bpm: Option<f64>,

    /// Time signature, e.g. 3/4
    #[arg(long)]
    meter: Option<Meter>,

    /// Steps per beat
    #[arg(long)]
    steps: Option<u32>,

    /// Bars per queue cycle
    #[arg(long)]
    bars: Option<u32>,

    /// Script to run (and watch) at start-up
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Tracing filter, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .merge(Overrides {
        bpm: args.bpm,
        meter: args.meter,
        steps: args.steps,
        bars: args.bars,
        script: args.script,
        log_level: args.log_level,
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.log_level()))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let clock = Clock::new(settings.clock)?;
    info!(bpm = settings.clock.bpm, meter = %settings.clock.meter, "starting");
    let runtime = Arc::new(RuntimeContext::new(clock.clone()));
    let mut repl = Repl::new(runtime, Arc::new(ConsoleSink));

    clock.start();
    if let Some(script) = &settings.script {
        repl.watch(script)?;
    }
    let result = repl.run();
    clock.stop();
    result
}
