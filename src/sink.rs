//! Where played events go.
//!
//! There is no synthesis here: a [`Sink`] receives each sounding step of a
//! player together with its parameters and renders it somewhere. The
//! console sink prints it; the memory sink keeps it for inspection.

use colored::*;
use livebeat_core::types::time::{to_f64, Time};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;

/// One sounding step
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub player: String,
    pub beat: Time,
    pub symbol: char,
    /// Length in beats
    pub duration: Time,
    pub params: BTreeMap<String, f64>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8.3} {} {:?} dur={}",
            to_f64(self.beat),
            self.player,
            self.symbol,
            self.duration
        )?;
        for (name, value) in &self.params {
            write!(f, " {}={}", name, value)?;
        }
        Ok(())
    }
}

pub trait Sink: Send + Sync {
    fn emit(&self, event: &Event) -> anyhow::Result<()>;
}

/// Prints every event on its own line
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn emit(&self, event: &Event) -> anyhow::Result<()> {
        println!(
            "{} {} {}",
            format!("{:>8.3}", to_f64(event.beat)).dimmed(),
            event.player.bright_magenta(),
            event.symbol.to_string().bright_cyan().bold()
        );
        Ok(())
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// The played symbols in order
    pub fn symbols(&self) -> String {
        self.events.lock().iter().map(|e| e.symbol).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Sink for MemorySink {
    fn emit(&self, event: &Event) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livebeat_core::types::time::time;

    #[test]
    fn test_display() {
        let mut params = BTreeMap::new();
        params.insert("amp".to_string(), 0.5);
        let event = Event {
            player: "d1".to_string(),
            beat: time(3, 2),
            symbol: 'x',
            duration: time(1, 2),
            params,
        };
        assert_eq!(event.to_string(), "   1.500 d1 'x' dur=1/2 amp=0.5");
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        for symbol in ['x', 'o'] {
            sink.emit(&Event {
                player: "d1".to_string(),
                beat: time(0, 1),
                symbol,
                duration: time(1, 2),
                params: BTreeMap::new(),
            })
            .unwrap();
        }
        assert_eq!(sink.symbols(), "xo");
        sink.clear();
        assert!(sink.events().is_empty());
    }
}
