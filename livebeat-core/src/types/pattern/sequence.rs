//! Sequence - the flat, timed output of the expander.

use super::node::PatternNode;
use super::parser::parse;
use super::step::{Step, Symbol};
use crate::error::PatternError;
use crate::types::time::{beats, Time};
use num_traits::Zero;
use std::fmt;

/// Expand bracket notation into a flat sequence of timed steps.
///
/// Every top-level character occupies one unit. The sequence covers the
/// whole repeat period of the notation: with alternation groups of lengths 2
/// and 3 the output holds 6 consecutive passes over the top level.
pub fn expand(notation: &str) -> Result<Sequence, PatternError> {
    let tree = parse(notation)?;
    Ok(Sequence::from_tree(notation, &tree))
}

/// Flat ordered list of steps; durations are exact fractions of one unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    notation: String,
    steps: Vec<Step>,
    period: usize,
    nominal: Time,
}

impl Sequence {
    fn from_tree(notation: &str, tree: &PatternNode) -> Self {
        let period = tree.period();
        let mut steps = Vec::new();
        for repeat in 0..period {
            tree.render(repeat, beats(1), &mut steps);
        }
        let nominal = match tree {
            PatternNode::Sequence(items) => beats(items.len() as i64),
            _ => beats(1),
        };
        Self {
            notation: notation.to_string(),
            steps,
            period,
            nominal,
        }
    }

    /// Source notation this sequence was expanded from
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, wrapping around the sequence
    pub fn get(&self, index: usize) -> Option<&Step> {
        if self.steps.is_empty() {
            None
        } else {
            self.steps.get(index % self.steps.len())
        }
    }

    /// Number of passes over the top level contained in the sequence
    pub fn period(&self) -> usize {
        self.period
    }

    /// Length of one pass: one unit per top-level element
    pub fn nominal_length(&self) -> Time {
        self.nominal
    }

    /// Sum of all step durations (`period * nominal_length`)
    pub fn total_duration(&self) -> Time {
        self.steps
            .iter()
            .fold(Time::zero(), |acc, step| acc + step.duration)
    }

    /// Characters of the plain steps, in order (choices are skipped)
    pub fn symbols(&self) -> Vec<char> {
        self.steps.iter().filter_map(Step::char).collect()
    }

    /// Plain steps rendered back as a string, choices shown as '?'
    pub fn symbol_string(&self) -> String {
        self.steps
            .iter()
            .map(|step| match step.symbol {
                Symbol::Char(c) => c,
                Symbol::Choice(_) => '?',
            })
            .collect()
    }

    /// The same steps played backwards
    pub fn reversed(&self) -> Self {
        let mut reversed = self.clone();
        reversed.steps.reverse();
        reversed
    }

    /// The same steps starting `n` positions later (negative rotates right)
    pub fn rotated(&self, n: i64) -> Self {
        let mut rotated = self.clone();
        if !rotated.steps.is_empty() {
            let len = rotated.steps.len() as i64;
            let shift = n.rem_euclid(len) as usize;
            rotated.steps.rotate_left(shift);
        }
        rotated
    }

    /// The same steps in a new order
    pub fn with_steps(&self, steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..self.clone()
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.notation)
    }
}
