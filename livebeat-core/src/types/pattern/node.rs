//! PatternNode enum - the parsed bracket tree.

use super::step::{Step, Symbol};
use crate::types::time::Time;
use num_integer::Integer;
use num_rational::Ratio;
use std::fmt;

/// A node of the notation tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternNode {
    /// Single played character; space and '.' are rests
    Leaf(char),
    /// Plain concatenation, one parent unit per element (top level only)
    Sequence(Vec<PatternNode>),
    /// `(a b)`: one element per repeat of the whole pattern, round-robin
    Alternation(Vec<PatternNode>),
    /// `[a b]`: contents squeezed into one parent unit
    Subdivision(Vec<PatternNode>),
    /// `{a b}`: single symbols are stacked into one unit, nested
    /// children become alternatives picked at playback
    Choice(Vec<PatternNode>),
}

impl PatternNode {
    /// Number of repeats of the whole pattern after which this node's output
    /// starts over.
    pub fn period(&self) -> usize {
        match self {
            PatternNode::Leaf(_) | PatternNode::Choice(_) => 1,
            PatternNode::Sequence(children) | PatternNode::Subdivision(children) => {
                lcm_of(children)
            }
            // Each child only advances on the repeats that select it
            PatternNode::Alternation(children) => children.len() * lcm_of(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PatternNode::Leaf(_))
    }

    /// Append the steps this node plays on repeat number `repeat`, where the
    /// node occupies `unit` beats.
    pub fn render(&self, repeat: usize, unit: Time, out: &mut Vec<Step>) {
        match self {
            PatternNode::Leaf(c) => out.push(Step::new(Symbol::Char(*c), unit)),
            PatternNode::Sequence(children) => {
                for child in children {
                    child.render(repeat, unit, out);
                }
            }
            PatternNode::Subdivision(children) => {
                let share = unit / Ratio::from_integer(children.len() as i64);
                for child in children {
                    child.render(repeat, share, out);
                }
            }
            PatternNode::Alternation(children) => {
                let k = children.len();
                children[repeat % k].render(repeat / k, unit, out);
            }
            PatternNode::Choice(children) => {
                if children.iter().all(PatternNode::is_leaf) {
                    let share = unit / Ratio::from_integer(children.len() as i64);
                    for child in children {
                        child.render(0, share, out);
                    }
                } else {
                    let mut options = Vec::new();
                    for child in children {
                        for variant in 0..child.period() {
                            let mut option = Vec::new();
                            child.render(variant, unit, &mut option);
                            options.push(option);
                        }
                    }
                    out.push(Step::new(Symbol::Choice(options), unit));
                }
            }
        }
    }

    fn brackets(&self) -> Option<(char, char)> {
        match self {
            PatternNode::Alternation(_) => Some(('(', ')')),
            PatternNode::Subdivision(_) => Some(('[', ']')),
            PatternNode::Choice(_) => Some(('{', '}')),
            _ => None,
        }
    }
}

fn lcm_of(children: &[PatternNode]) -> usize {
    children
        .iter()
        .map(PatternNode::period)
        .fold(1, |acc, p| acc.lcm(&p))
}

impl fmt::Display for PatternNode {
    /// Writes the node back in bracket notation
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Leaf(c) => write!(f, "{}", c),
            PatternNode::Sequence(children)
            | PatternNode::Alternation(children)
            | PatternNode::Subdivision(children)
            | PatternNode::Choice(children) => {
                let brackets = self.brackets();
                if let Some((open, _)) = brackets {
                    write!(f, "{}", open)?;
                }
                for child in children {
                    write!(f, "{}", child)?;
                }
                if let Some((_, close)) = brackets {
                    write!(f, "{}", close)?;
                }
                Ok(())
            }
        }
    }
}
