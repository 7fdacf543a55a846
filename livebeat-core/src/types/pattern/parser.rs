//! Recursive-descent parser for bracket notation.

use super::node::PatternNode;
use crate::error::PatternError;

/// Parse a notation string into a tree. The root is always a
/// [`PatternNode::Sequence`].
pub fn parse(notation: &str) -> Result<PatternNode, PatternError> {
    let mut chars = notation.chars().enumerate();
    let items = parse_items(&mut chars, None)?;
    if items.is_empty() {
        return Err(PatternError::Empty);
    }
    Ok(PatternNode::Sequence(items))
}

/// Parse items until the bracket opened by `open` closes (or the input ends
/// when `open` is `None`).
fn parse_items<I>(chars: &mut I, open: Option<(char, usize)>) -> Result<Vec<PatternNode>, PatternError>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut items = Vec::new();

    while let Some((position, c)) = chars.next() {
        match c {
            '(' | '[' | '{' => {
                let inner = parse_items(chars, Some((c, position)))?;
                if inner.is_empty() {
                    return Err(PatternError::EmptyGroup { open: c, position });
                }
                items.push(match c {
                    '(' => PatternNode::Alternation(inner),
                    '[' => PatternNode::Subdivision(inner),
                    _ => PatternNode::Choice(inner),
                });
            }
            ')' | ']' | '}' => {
                return match open {
                    Some((o, _)) if closing(o) == c => Ok(items),
                    Some((o, _)) => Err(PatternError::Mismatched {
                        expected: closing(o),
                        found: c,
                        position,
                    }),
                    None => Err(PatternError::UnexpectedClose { found: c, position }),
                };
            }
            // Layout characters carry no timing
            '\t' | '\n' | '\r' => {}
            _ => items.push(PatternNode::Leaf(c)),
        }
    }

    match open {
        Some((open, position)) => Err(PatternError::Unclosed { open, position }),
        None => Ok(items),
    }
}

/// Matching closing bracket
pub(crate) fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}
