//! Segment lists: values, their durations and the curve between them.

use crate::error::TimeVarError;
use crate::types::time::{beats, to_f64, wrap, Time};
use num_traits::{Signed, Zero};
use std::fmt;
use tracing::warn;

/// Length a non-final `Forever` segment is clamped to, in beats.
pub const FOREVER_CLAMP: i64 = 65536;

/// Duration of one segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span {
    Beats(Time),
    /// Hold this value indefinitely once reached (only meaningful last)
    Forever,
}

impl Span {
    pub fn beats(n: i64) -> Self {
        Span::Beats(beats(n))
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Span::Forever)
    }
}

impl From<Time> for Span {
    fn from(t: Time) -> Self {
        Span::Beats(t)
    }
}

impl From<i64> for Span {
    fn from(n: i64) -> Self {
        Span::beats(n)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Beats(t) => write!(f, "{}", t),
            Span::Forever => write!(f, "inf"),
        }
    }
}

/// How a segment moves towards the next value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Curve {
    /// Constant for the whole segment
    #[default]
    Step,
    Linear,
    /// Quarter sine: eases out when rising, eases in when falling
    Sine,
    /// Squared progress
    Exponential,
}

impl Curve {
    /// Value between `current` and `next` at progress `p` in `[0, 1)`
    pub fn shape(self, current: f64, next: f64, p: f64) -> f64 {
        let p = match self {
            Curve::Step => return current,
            Curve::Linear => p,
            Curve::Exponential => p * p,
            Curve::Sine => {
                if current > next {
                    (p * 90.0 + 270.0).to_radians().sin() + 1.0
                } else {
                    (p * 90.0).to_radians().sin()
                }
            }
        };
        current * (1.0 - p) + next * p
    }

    pub fn name(self) -> &'static str {
        match self {
            Curve::Step => "var",
            Curve::Linear => "linvar",
            Curve::Sine => "sinvar",
            Curve::Exponential => "expvar",
        }
    }
}

/// Values laid out on a repeating timeline
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segments {
    pub values: Vec<f64>,
    /// Durations exactly as given (cycled over the values)
    pub durations: Vec<Span>,
    pub curve: Curve,
    /// Cumulative end of every finite segment
    ends: Vec<Time>,
    /// Sum of the finite segments
    cycle: Time,
    /// The last segment lasts forever
    held_tail: bool,
}

impl Segments {
    pub fn new(values: Vec<f64>, durations: Vec<Span>, curve: Curve) -> Result<Self, TimeVarError> {
        if values.is_empty() {
            return Err(TimeVarError::NoValues);
        }
        if durations.is_empty() {
            return Err(TimeVarError::NoDurations);
        }
        if let Some(Span::Beats(bad)) = durations
            .iter()
            .find(|span| matches!(span, Span::Beats(t) if !t.is_positive()))
        {
            return Err(TimeVarError::NonPositiveDuration(bad.to_string()));
        }

        let last = values.len() - 1;
        let mut ends = Vec::with_capacity(values.len());
        let mut cycle = Time::zero();
        let mut held_tail = false;

        for i in 0..values.len() {
            match durations[i % durations.len()] {
                Span::Beats(t) => {
                    cycle += t;
                    ends.push(cycle);
                }
                Span::Forever if i == last => held_tail = true,
                Span::Forever => {
                    warn!(
                        segment = i,
                        "infinite duration before the last segment, clamped to {} beats", FOREVER_CLAMP
                    );
                    cycle += beats(FOREVER_CLAMP);
                    ends.push(cycle);
                }
            }
        }

        Ok(Self {
            values,
            durations,
            curve,
            ends,
            cycle,
            held_tail,
        })
    }

    /// Whether reading can reach a held value
    pub fn has_hold(&self) -> bool {
        self.held_tail
    }

    /// Length of one pass, `None` when the last segment holds forever
    pub fn cycle_length(&self) -> Option<Time> {
        if self.held_tail {
            None
        } else {
            Some(self.cycle)
        }
    }

    /// Durations resolved per segment
    pub fn spans(&self) -> Vec<Span> {
        (0..self.values.len())
            .map(|i| self.durations[i % self.durations.len()])
            .collect()
    }

    pub fn is_tail(&self, index: usize) -> bool {
        self.held_tail && index == self.values.len() - 1
    }

    /// Segment active at `beat` and the progress through it
    pub fn locate(&self, beat: Time) -> (usize, f64) {
        let finite = self.ends.len();
        if finite == 0 || (self.held_tail && beat >= self.cycle) {
            return (self.values.len() - 1, 0.0);
        }

        let t = wrap(beat, self.cycle);
        let index = self.ends.partition_point(|end| *end <= t).min(finite - 1);
        let start = if index == 0 {
            Time::zero()
        } else {
            self.ends[index - 1]
        };
        let progress = to_f64((t - start) / (self.ends[index] - start));
        (index, progress)
    }

    /// Raw (dependency-free) value of a segment at a given progress
    pub fn shaped(&self, index: usize, progress: f64) -> f64 {
        let current = self.values[index];
        let next = self.values[(index + 1) % self.values.len()];
        self.curve.shape(current, next, progress)
    }
}

impl fmt::Display for Segments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        let durations: Vec<String> = self.durations.iter().map(|d| d.to_string()).collect();
        write!(
            f,
            "{}([{}], [{}])",
            self.curve.name(),
            values.join(", "),
            durations.join(", ")
        )
    }
}
