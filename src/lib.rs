//! # Livebeat
//!
//! An interactive front end for `livebeat-core`: players that turn
//! bracket patterns into events, sinks that receive those events, a command
//! language for driving the clock, and a REPL that can hot-reload scripts.
//!
//! ## Modules
//!
//! - `commands`: the command registry and its handlers.
//! - `config`: the JSON settings file and command-line overrides.
//! - `player`: `SamplePlayer`, a pattern player with repeatable methods.
//! - `repl`: the prompt loop, script runner and file watcher.
//! - `sink`: where played events go.

pub mod commands;
pub mod config;
pub mod player;
pub mod repl;
pub mod sink;

pub use crate::config::Settings;
pub use crate::player::SamplePlayer;
pub use crate::repl::Repl;
pub use crate::sink::{ConsoleSink, Event, MemorySink, Sink};
