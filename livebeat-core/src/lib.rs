//! # Livebeat Core
//!
//! Beat-synchronous scheduling for live-coded music: a step-queue clock,
//! time-varying values, a bracket-notation pattern expander and periodic
//! method calls. No audio here; players hand their events to whatever
//! output the front end provides.
//!
//! ## Features
//!
//! - **serde**: Serialize clock configuration and pattern errors
//!
//! ## Example
//!
//! ```ignore
//! use livebeat_core::clock::Clock;
//! use livebeat_core::types::{expand, ClockConfig};
//!
//! let clock = Clock::new(ClockConfig::new(140.0))?;
//! let seq = expand("x-o[-o]")?;
//! println!("{} steps over {} beats", seq.len(), seq.total_duration());
//! clock.start();
//! ```

pub mod clock;
pub mod context;
pub mod error;
pub mod repeat;
pub mod types;

pub use clock::{Clock, Player, PlayerId, SharedPlayer, When};
pub use context::RuntimeContext;
pub use error::{ClockError, PatternError, RepeatError, TimeVarError};
pub use repeat::{bind, Dispatch, MethodCall, Repeats};
pub use types::{expand, ClockConfig, Sequence, Span, Time, TimeVar};
