//! Layered notation: `<x-o-><  * >` plays each angle-bracket group as its
//! own sequence, all at the same time.

use super::parser::closing;
use super::sequence::{expand, Sequence};
use crate::error::PatternError;

/// Split top-level `<...>` groups into independently expanded layers.
///
/// Notation that does not start with `<` is a single layer, and a `<`
/// further inside it is an ordinary symbol.
pub fn expand_layers(notation: &str) -> Result<Vec<Sequence>, PatternError> {
    if !notation.trim_start().starts_with('<') {
        return Ok(vec![expand(notation)?]);
    }

    let mut layers = Vec::new();
    let mut chars = notation.chars().enumerate();

    while let Some((position, c)) = chars.next() {
        match c {
            '<' => {
                let content = take_layer(&mut chars, position)?;
                if content.is_empty() {
                    return Err(PatternError::EmptyGroup { open: '<', position });
                }
                layers.push(expand(&content)?);
            }
            '>' => return Err(PatternError::UnexpectedClose { found: c, position }),
            c if c.is_whitespace() => {}
            _ => return Err(PatternError::LooseLayerContent { position }),
        }
    }

    Ok(layers)
}

/// Take content until the '>' matching the '<' at `open_position`
fn take_layer<I>(chars: &mut I, open_position: usize) -> Result<String, PatternError>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut content = String::new();
    let mut depth = 1;

    for (_, c) in chars.by_ref() {
        match c {
            '<' => {
                depth += 1;
                content.push(c);
            }
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(content);
                }
                content.push(c);
            }
            _ => content.push(c),
        }
    }

    Err(PatternError::Unclosed {
        open: '<',
        position: open_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_layers() {
        let layers = expand_layers("<X   ><-   >").unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].symbol_string(), "X   ");
        assert_eq!(layers[1].symbol_string(), "-   ");
    }

    #[test]
    fn test_plain_notation_is_one_layer() {
        let layers = expand_layers("x-o<").unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].symbols(), vec!['x', '-', 'o', '<']);
    }

    #[test]
    fn test_layer_errors() {
        assert_eq!(
            expand_layers("<x-o"),
            Err(PatternError::Unclosed {
                open: '<',
                position: 0
            })
        );
        assert_eq!(
            expand_layers("<x> y"),
            Err(PatternError::LooseLayerContent { position: 4 })
        );
        assert_eq!(
            expand_layers("<x><>"),
            Err(PatternError::EmptyGroup {
                open: '<',
                position: 3
            })
        );
        assert!(matches!(
            expand_layers("<x[>"),
            Err(PatternError::Unclosed { open: '[', .. })
        ));
    }

    #[test]
    fn test_closing_table() {
        assert_eq!(closing('<'), '>');
    }
}
