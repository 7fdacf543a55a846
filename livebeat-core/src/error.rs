//! Error taxonomy for the core.
//!
//! Syntax errors in pattern notation and invalid TimeVar definitions fail
//! fast and are handed back to the caller. Failures inside running code
//! (watchers, players, method calls) are never surfaced as errors here: the
//! clock logs them and keeps ticking.

use thiserror::Error;

/// Malformed bracket notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternError {
    #[error("notation is empty")]
    Empty,
    #[error("unclosed '{open}' opened at position {position}")]
    Unclosed { open: char, position: usize },
    #[error("expected '{expected}' but found '{found}' at position {position}")]
    Mismatched {
        expected: char,
        found: char,
        position: usize,
    },
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedClose { found: char, position: usize },
    #[error("empty '{open}' group at position {position}")]
    EmptyGroup { open: char, position: usize },
    #[error("layered notation mixes '<...>' layers with loose symbols at position {position}")]
    LooseLayerContent { position: usize },
}

/// Invalid TimeVar definition or composition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeVarError {
    #[error("a time-varying value needs at least one value")]
    NoValues,
    #[error("a time-varying value needs at least one duration")]
    NoDurations,
    #[error("durations must be positive, got {0}")]
    NonPositiveDuration(String),
    #[error("composition would make the value depend on itself")]
    DependencyCycle,
}

/// Invalid clock parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    #[error("tempo must be a finite BPM with steps no longer than a minute, got {0}")]
    InvalidTempo(f64),
    #[error("steps per beat must be at least 1, got {0}")]
    InvalidSteps(u32),
    #[error("invalid time signature {0}/{1}")]
    InvalidMeter(u32, u32),
    #[error("cycle length must be at least one bar, got {0}")]
    InvalidBars(u32),
}

/// Invalid periodic method call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepeatError {
    #[error("repeat intervals must be positive, got {0}")]
    NonPositiveInterval(String),
}
