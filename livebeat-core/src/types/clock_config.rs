//! Clock configuration types
//!
//! Pure data describing tempo and the shape of the clock's step queue. The
//! queue holds `steps_per_beat * meter.numerator * bars` slots.

use crate::error::ClockError;
use std::fmt;
use std::str::FromStr;

/// Longest wall-clock gap allowed between two ticks, in seconds
pub const MAX_STEP_SECS: f64 = 60.0;

/// Time signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meter {
    pub numerator: u32,
    pub denominator: u32,
}

impl Meter {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn validate(&self) -> Result<(), ClockError> {
        if self.numerator == 0 || self.denominator == 0 {
            return Err(ClockError::InvalidMeter(self.numerator, self.denominator));
        }
        Ok(())
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for Meter {
    type Err = ClockError;

    /// Parse "3/4" style signatures
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s.split_once('/').ok_or(ClockError::InvalidMeter(0, 0))?;
        let num = num.trim().parse().map_err(|_| ClockError::InvalidMeter(0, 0))?;
        let den = den.trim().parse().map_err(|_| ClockError::InvalidMeter(num, 0))?;
        let meter = Meter::new(num, den);
        meter.validate()?;
        Ok(meter)
    }
}

/// Tempo and queue geometry for a [`Clock`](crate::clock::Clock)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockConfig {
    /// Beats per minute
    pub bpm: f64,
    /// Time signature; the numerator sets the beats per bar
    pub meter: Meter,
    /// Length of one queue cycle in bars
    pub bars: u32,
    /// Subdivision granularity: ticks per beat
    pub steps_per_beat: u32,
}

impl ClockConfig {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }

    pub fn with_meter(mut self, numerator: u32, denominator: u32) -> Self {
        self.meter = Meter::new(numerator, denominator);
        self
    }

    pub fn with_bars(mut self, bars: u32) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_steps(mut self, steps_per_beat: u32) -> Self {
        self.steps_per_beat = steps_per_beat;
        self
    }

    pub fn validate(&self) -> Result<(), ClockError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(ClockError::InvalidTempo(self.bpm));
        }
        if self.steps_per_beat == 0 {
            return Err(ClockError::InvalidSteps(self.steps_per_beat));
        }
        if self.step_secs() > MAX_STEP_SECS {
            return Err(ClockError::InvalidTempo(self.bpm));
        }
        if self.bars == 0 {
            return Err(ClockError::InvalidBars(self.bars));
        }
        self.meter.validate()
    }

    /// Beats in one bar
    pub fn beats_per_bar(&self) -> u32 {
        self.meter.numerator
    }

    /// Beats in one queue cycle
    pub fn beats(&self) -> u32 {
        self.meter.numerator * self.bars
    }

    /// Number of queue slots: steps per beat times beats per cycle
    pub fn queue_len(&self) -> usize {
        (self.steps_per_beat * self.beats()) as usize
    }

    /// Steps in one bar
    pub fn bar_steps(&self) -> u64 {
        (self.steps_per_beat * self.meter.numerator) as u64
    }

    /// Wall-clock seconds between ticks
    pub fn step_secs(&self) -> f64 {
        60.0 / self.bpm / self.steps_per_beat as f64
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            meter: Meter::default(),
            bars: 1,
            steps_per_beat: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let config = ClockConfig::default();
        assert_eq!(config.queue_len(), 16);
        assert_eq!(config.bar_steps(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_len_follows_all_parameters() {
        let config = ClockConfig::new(90.0).with_meter(3, 4).with_bars(2).with_steps(8);
        assert_eq!(config.queue_len(), 8 * 3 * 2);
        assert_eq!(config.beats(), 6);
    }

    #[test]
    fn test_step_secs() {
        // 120 BPM, 4 steps per beat: 0.5s / 4
        assert!((ClockConfig::default().step_secs() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            ClockConfig::new(0.0).validate(),
            Err(ClockError::InvalidTempo(0.0))
        );
        assert_eq!(
            ClockConfig::new(1e-20).validate(),
            Err(ClockError::InvalidTempo(1e-20))
        );
        assert_eq!(
            ClockConfig::new(0.5).with_steps(1).validate(),
            Err(ClockError::InvalidTempo(0.5))
        );
        assert!(ClockConfig::new(1.0).with_steps(1).validate().is_ok());
        assert_eq!(
            ClockConfig::default().with_steps(0).validate(),
            Err(ClockError::InvalidSteps(0))
        );
        assert_eq!(
            ClockConfig::default().with_bars(0).validate(),
            Err(ClockError::InvalidBars(0))
        );
        assert_eq!(
            ClockConfig::default().with_meter(0, 4).validate(),
            Err(ClockError::InvalidMeter(0, 4))
        );
    }

    #[test]
    fn test_meter_parsing() {
        assert_eq!("3/4".parse::<Meter>(), Ok(Meter::new(3, 4)));
        assert_eq!(" 7 / 8 ".parse::<Meter>(), Ok(Meter::new(7, 8)));
        assert!("3".parse::<Meter>().is_err());
        assert!("0/4".parse::<Meter>().is_err());
        assert_eq!(Meter::new(5, 4).to_string(), "5/4");
    }
}
