//! Bracket notation for rhythmic sequences
//!
//! A pattern string such as `"x-o[-o]"` is parsed into a [`PatternNode`]
//! tree and flattened into a [`Sequence`] of exactly-timed [`Step`]s:
//!
//! - `[...]` squeezes its contents into one unit
//! - `(...)` plays one element per repeat of the whole pattern
//! - `{...}` stacks single symbols into one unit, or offers its nested
//!   children as alternatives picked at playback
//! - `<...><...>` plays several sequences at the same time

mod layers;
mod node;
mod parser;
mod sequence;
mod step;

#[cfg(test)]
mod tests;

pub use layers::expand_layers;
pub use node::PatternNode;
pub use parser::parse;
pub use sequence::{expand, Sequence};
pub use step::{Step, Symbol};
