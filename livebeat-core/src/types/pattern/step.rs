//! Step - one element of an expanded sequence.

use crate::types::time::Time;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// What a step plays
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// A single character (sample name, rest, ...)
    Char(char),
    /// Alternative sub-sequences, one of which is picked each time the step
    /// is played. Every option spans the step's full duration.
    Choice(Vec<Vec<Step>>),
}

/// A symbol and how long it lasts, in units of the player's base duration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub symbol: Symbol,
    pub duration: Time,
}

impl Step {
    pub fn new(symbol: Symbol, duration: Time) -> Self {
        Self { symbol, duration }
    }

    /// The played character, if this step is not a choice
    pub fn char(&self) -> Option<char> {
        match self.symbol {
            Symbol::Char(c) => Some(c),
            Symbol::Choice(_) => None,
        }
    }

    /// Space and '.' are silent
    pub fn is_rest(&self) -> bool {
        matches!(self.symbol, Symbol::Char(' ') | Symbol::Char('.'))
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.symbol, Symbol::Choice(_))
    }

    /// Pick one option of every choice (recursively) and return the plain
    /// steps to play. Plain steps resolve to themselves.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Step> {
        match &self.symbol {
            Symbol::Char(_) => vec![self.clone()],
            Symbol::Choice(options) => match options.choose(rng) {
                Some(option) => option.iter().flat_map(|s| s.resolve(rng)).collect(),
                None => Vec::new(),
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Symbol::Char(c) => write!(f, "{:?}@{}", c, self.duration),
            Symbol::Choice(options) => write!(f, "{{{} options}}@{}", options.len(), self.duration),
        }
    }
}
