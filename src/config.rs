//! Settings file for the binary.
//!
//! ```json
//! {
//!   "clock": { "bpm": 140, "meter": { "numerator": 3, "denominator": 4 } },
//!   "script": "set.lb",
//!   "log_level": "debug"
//! }
//! ```
//!
//! Every field is optional; command-line flags win over the file.

use anyhow::Context;
use livebeat_core::types::{ClockConfig, Meter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clock: ClockConfig,
    /// Commands run at start-up
    pub script: Option<PathBuf>,
    /// Tracing filter, e.g. "info" or "livebeat_core=debug"
    pub log_level: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bpm: Option<f64>,
    pub meter: Option<Meter>,
    pub steps: Option<u32>,
    pub bars: Option<u32>,
    pub script: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.clock.validate()?;
        Ok(settings)
    }

    /// Apply command-line values on top and validate the result
    pub fn merge(mut self, overrides: Overrides) -> anyhow::Result<Self> {
        if let Some(bpm) = overrides.bpm {
            self.clock.bpm = bpm;
        }
        if let Some(meter) = overrides.meter {
            self.clock.meter = meter;
        }
        if let Some(steps) = overrides.steps {
            self.clock.steps_per_beat = steps;
        }
        if let Some(bars) = overrides.bars {
            self.clock.bars = bars;
        }
        if overrides.script.is_some() {
            self.script = overrides.script;
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level;
        }
        self.clock.validate()?;
        Ok(self)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file() {
        let settings = Settings::from_json(r#"{ "clock": { "bpm": 140 } }"#).unwrap();
        assert_eq!(settings.clock.bpm, 140.0);
        assert_eq!(settings.clock.steps_per_beat, 4);
        assert_eq!(settings.clock.meter, Meter::new(4, 4));
        assert_eq!(settings.log_level(), "info");
    }

    #[test]
    fn test_invalid_clock_rejected() {
        assert!(Settings::from_json(r#"{ "clock": { "bpm": -1 } }"#).is_err());
        assert!(Settings::from_json("{ nope").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::from_json(r#"{ "clock": { "bpm": 140 }, "log_level": "warn" }"#)
            .unwrap()
            .merge(Overrides {
                bpm: Some(90.0),
                meter: Some(Meter::new(3, 4)),
                log_level: Some("debug".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.clock.bpm, 90.0);
        assert_eq!(settings.clock.beats_per_bar(), 3);
        assert_eq!(settings.log_level(), "debug");

        let bad = Settings::default().merge(Overrides {
            steps: Some(0),
            ..Default::default()
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "script": "set.lb", "clock": {{ "bars": 2 }} }}"#).unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.clock.bars, 2);
        assert_eq!(settings.script, Some(PathBuf::from("set.lb")));

        assert!(Settings::load(Path::new("/nonexistent/livebeat.json")).is_err());
    }
}
