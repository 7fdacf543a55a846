//! Core data types: exact time, cyclic parameter lists, clock
//! configuration, bracket patterns and time-varying values.

pub mod clock_config;
pub mod cycle;
pub mod pattern;
pub mod time;
pub mod timevar;

pub use clock_config::{ClockConfig, Meter};
pub use cycle::Cycle;
pub use pattern::{expand, expand_layers, Sequence, Step, Symbol};
pub use time::Time;
pub use timevar::{BeatSource, BinOp, Curve, Span, TimeVar};
