//! Interactive prompt and script runner.
//!
//! The line editor runs on its own thread. The main loop selects over typed
//! lines, file-change events for watched scripts and commands queued by
//! watcher actions, so a `when` firing on the clock thread never runs a
//! command there.

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::repl::watcher::FileWatcher;
use crate::sink::Sink;
use anyhow::{anyhow, bail, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use livebeat_core::RuntimeContext;
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

pub mod watcher;

/// Scripts may `run` other scripts up to this depth
const MAX_RUN_DEPTH: usize = 8;

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

pub struct Repl {
    registry: CommandRegistry,
    ctx: CommandContext,
    depth: usize,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,
    rx_deferred: Receiver<String>,

    watcher: Option<FileWatcher>,
}

impl Repl {
    pub fn new(runtime: Arc<RuntimeContext>, sink: Arc<dyn Sink>) -> Self {
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();
        let (tx_deferred, rx_deferred) = unbounded();
        Self {
            registry: create_registry(),
            ctx: CommandContext::new(runtime, sink, tx_deferred),
            depth: 0,
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            rx_deferred,
            watcher: None,
        }
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Run one command line and print its outcome
    pub fn execute(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Flow::Continue;
        }
        debug!(command = line, "executing");
        let result = self.registry.execute(line, &mut self.ctx);
        self.report(line, result)
    }

    fn report(&mut self, line: &str, result: CommandResult) -> Flow {
        match result {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => return Flow::Exit,
            CommandResult::Error(e) => println!("{} {}", "Error:".bright_red().bold(), e.red()),
            CommandResult::NotACommand => {
                println!(
                    "{} unknown command '{}' (try 'help')",
                    "Error:".bright_red().bold(),
                    line
                );
            }
            CommandResult::Watch(path) => {
                if let Err(e) = self.watch(Path::new(&path)) {
                    println!("{} {}", "Error:".bright_red().bold(), e.to_string().red());
                }
            }
            CommandResult::Run(path) => match self.run_file(Path::new(&path)) {
                Ok(flow) => return flow,
                Err(e) => println!("{} {}", "Error:".bright_red().bold(), e.to_string().red()),
            },
        }
        Flow::Continue
    }

    /// Execute every command in a script file
    pub fn run_file(&mut self, path: &Path) -> Result<Flow> {
        if self.depth >= MAX_RUN_DEPTH {
            bail!("scripts nested deeper than {} levels", MAX_RUN_DEPTH);
        }
        let script = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e))?;
        debug!(path = %path.display(), "running script");

        self.depth += 1;
        let mut flow = Flow::Continue;
        for line in script.lines() {
            flow = self.execute(line);
            if flow == Flow::Exit {
                break;
            }
        }
        self.depth -= 1;
        Ok(flow)
    }

    /// Run `path` now and again whenever it changes
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        if self.watcher.is_none() {
            let watcher = FileWatcher::new(self.tx_watcher.clone())
                .map_err(|e| anyhow!("failed to create watcher: {}", e))?;
            self.watcher = Some(watcher);
        }
        if let Some(watcher) = &mut self.watcher {
            watcher
                .watch(path)
                .map_err(|e| anyhow!("failed to watch {}: {}", path.display(), e))?;
        }
        println!("Watching {} for changes...", path.display().to_string().bright_green());
        self.run_file(path)?;
        Ok(())
    }

    /// Re-run scripts touched by a file event
    pub fn on_file_event(&mut self, event: Event) -> Flow {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return Flow::Continue;
        }
        for path in event.paths {
            println!("{} File changed: {}", "*".bright_yellow(), path.display());
            match self.run_file(&path) {
                Ok(Flow::Exit) => return Flow::Exit,
                Ok(Flow::Continue) => {}
                Err(e) => println!("{} {}", "Error:".bright_red().bold(), e.to_string().red()),
            }
        }
        Flow::Continue
    }

    /// Run commands queued by watcher actions
    pub fn drain_deferred(&mut self) -> Flow {
        while let Ok(line) = self.rx_deferred.try_recv() {
            if self.execute(&line) == Flow::Exit {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Livebeat".bright_cyan().bold());
        println!(
            "Type '{}' for commands, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let mut editor =
            DefaultEditor::new().map_err(|e| anyhow!("failed to initialize line editor: {}", e))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "livebeat>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        loop {
            let flow = crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => self.execute(&line),
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted | ReadlineError::Eof))) => Flow::Exit,
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!("{} {}", "Error reading input:".bright_red().bold(), err.to_string().red());
                        Flow::Exit
                    }
                    Err(_) => Flow::Exit,
                },
                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.on_file_event(event),
                    Ok(Err(e)) => {
                        warn!(error = %e, "file watch error");
                        Flow::Continue
                    }
                    Err(_) => Flow::Continue,
                },
                recv(self.rx_deferred) -> msg => match msg {
                    Ok(line) => self.execute(&line),
                    Err(_) => Flow::Continue,
                },
            };
            if flow == Flow::Exit {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
        }

        Ok(())
    }
}
