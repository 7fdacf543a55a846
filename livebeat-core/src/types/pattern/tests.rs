//! Tests for pattern module.

use super::*;
use crate::error::PatternError;
use crate::types::time::{beats, time, Time};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn durations(seq: &Sequence) -> Vec<Time> {
    seq.iter().map(|s| s.duration).collect()
}

/// Count of every non-rest symbol
fn multiset(seq: &Sequence) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for step in seq.iter().filter(|s| !s.is_rest()) {
        if let Some(c) = step.char() {
            *counts.entry(c).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn test_plain_symbols() {
    let seq = expand("x-o-").unwrap();
    assert_eq!(seq.len(), 4);
    assert_eq!(seq.symbols(), vec!['x', '-', 'o', '-']);
    assert_eq!(seq.total_duration(), beats(4));
    assert_eq!(seq.period(), 1);
}

#[test]
fn test_subdivision() {
    let seq = expand("x-o[-o]").unwrap();
    assert_eq!(seq.len(), 5);
    assert_eq!(
        durations(&seq),
        vec![beats(1), beats(1), beats(1), time(1, 2), time(1, 2)]
    );
    assert_eq!(seq.total_duration(), beats(4));
    assert_eq!(seq.nominal_length(), beats(4));
}

#[test]
fn test_nested_subdivision() {
    let seq = expand("[[ab]c]").unwrap();
    assert_eq!(seq.symbols(), vec!['a', 'b', 'c']);
    assert_eq!(durations(&seq), vec![time(1, 4), time(1, 4), time(1, 2)]);
}

#[test]
fn test_alternation_round_robin() {
    let seq = expand("(x )( x)o ").unwrap();
    assert_eq!(seq.period(), 2);
    assert_eq!(seq.symbol_string(), "x o  xo ");
    assert_eq!(seq.total_duration(), beats(8));
}

#[test]
fn test_alternation_inside_run() {
    let seq = expand("---(-=)").unwrap();
    assert_eq!(seq.symbol_string(), "-------=");
}

#[test]
fn test_alternation_lcm() {
    let seq = expand("(ab)(cde)").unwrap();
    assert_eq!(seq.period(), 6);
    assert_eq!(seq.len(), 12);
    assert_eq!(seq.symbol_string(), "acbdaebcadbe");
}

#[test]
fn test_nested_alternation() {
    // The inner group advances only on the repeats that select it
    let seq = expand("(a(bc))").unwrap();
    assert_eq!(seq.period(), 4);
    assert_eq!(seq.symbol_string(), "abac");
}

#[test]
fn test_documented_equivalence() {
    let a = expand("x-o(-[-o])").unwrap();
    let b = expand("x-o[-(o )]").unwrap();
    assert_eq!(a.total_duration(), beats(8));
    assert_eq!(a.total_duration(), b.total_duration());
    assert_eq!(multiset(&a), multiset(&b));
}

#[test]
fn test_stacked_choice() {
    let seq = expand("x-o{---}").unwrap();
    assert_eq!(seq.len(), 6);
    assert_eq!(seq.total_duration(), beats(4));
    assert_eq!(durations(&seq)[3..], [time(1, 3), time(1, 3), time(1, 3)]);
}

#[test]
fn test_nested_choice_is_resolved_at_playback() {
    let seq = expand("x-o{-=[--][-o]}").unwrap();
    assert_eq!(seq.len(), 4);
    let last = &seq.steps()[3];
    assert!(last.is_choice());
    assert_eq!(last.duration, beats(1));
    match &last.symbol {
        Symbol::Choice(options) => {
            assert_eq!(options.len(), 4);
            for option in options {
                let total: Time = option.iter().fold(Time::from_integer(0), |a, s| a + s.duration);
                assert_eq!(total, beats(1));
            }
        }
        Symbol::Char(_) => panic!("Expected Choice"),
    }
}

#[test]
fn test_resolve_with_seeded_rng() {
    let seq = expand("{a[bc]}").unwrap();
    let step = &seq.steps()[0];
    let mut first = StdRng::seed_from_u64(7);
    let mut second = StdRng::seed_from_u64(7);
    let picked = step.resolve(&mut first);
    assert_eq!(picked, step.resolve(&mut second));
    let total: Time = picked.iter().fold(Time::from_integer(0), |a, s| a + s.duration);
    assert_eq!(total, beats(1));
    assert!(picked.iter().all(|s| !s.is_choice()));
}

#[test]
fn test_expansion_is_pure() {
    let a = expand("x-o{-=[--][-o]}(ab)").unwrap();
    let b = expand("x-o{-=[--][-o]}(ab)").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_rests() {
    let seq = expand("x . ").unwrap();
    let rests: Vec<bool> = seq.iter().map(Step::is_rest).collect();
    assert_eq!(rests, vec![false, true, true, true]);
}

#[test]
fn test_layout_whitespace_is_ignored() {
    let seq = expand("x-\n\to-").unwrap();
    assert_eq!(seq.symbol_string(), "x-o-");
}

#[test]
fn test_syntax_errors() {
    assert_eq!(expand(""), Err(PatternError::Empty));
    assert_eq!(
        expand("x[-o"),
        Err(PatternError::Unclosed {
            open: '[',
            position: 1
        })
    );
    assert_eq!(
        expand("x[-o)"),
        Err(PatternError::Mismatched {
            expected: ']',
            found: ')',
            position: 4
        })
    );
    assert_eq!(
        expand("x-o]"),
        Err(PatternError::UnexpectedClose {
            found: ']',
            position: 3
        })
    );
    assert_eq!(
        expand("x()"),
        Err(PatternError::EmptyGroup {
            open: '(',
            position: 1
        })
    );
}

#[test]
fn test_reversed_and_rotated() {
    let seq = expand("abc[de]").unwrap();
    assert_eq!(seq.reversed().symbol_string(), "edcba");
    assert_eq!(seq.rotated(1).symbol_string(), "bcdea");
    assert_eq!(seq.rotated(-1).symbol_string(), "eabcd");
    assert_eq!(seq.rotated(1).total_duration(), seq.total_duration());
}

#[test]
fn test_get_wraps() {
    let seq = expand("ab").unwrap();
    assert_eq!(seq.get(3).and_then(Step::char), Some('b'));
}

#[test]
fn test_display_round_trips_notation() {
    let tree = parse("x(ab)[c{de}]").unwrap();
    assert_eq!(tree.to_string(), "x(ab)[c{de}]");
}
