//! Fuzzing tests for the note notation parser
//!
//! Random and malformed note text must never panic, and every symbol must
//! end up either in the schedule or in the error log.

use pianola::sequencer::{ParseError, ParserLimits, parse, parse_with_limits};
use rand::Rng;
use rand::seq::SliceRandom;

const ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'a', 'c', 'g', 'H', 'X', 'R', 'r', '-', '#', 's', 'b',
    'n', '0', '1', '4', '8', '9', ':', ' ', ',', '|', '\t', '\n', '?', 'é',
];

fn random_text(rng: &mut impl Rng, max_len: usize) -> String {
    let len = rng.gen_range(0..=max_len);
    (0..len)
        .map(|_| *ALPHABET.choose(rng).unwrap_or(&' '))
        .collect()
}

fn symbol_count(text: &str) -> usize {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '|')
        .filter(|s| !s.is_empty())
        .count()
}

/// Random characters from the notation alphabet
#[test]
fn fuzz_parser_random_text() {
    let mut rng = rand::thread_rng();
    let unlimited = ParserLimits {
        max_tokens: usize::MAX,
        max_ticks: u64::MAX,
    };

    for _ in 0..2000 {
        let text = random_text(&mut rng, 64);
        let (schedule, errors) = parse_with_limits(&text, &unlimited);

        // Every symbol is accounted for exactly once
        let symbol_errors = errors
            .entries()
            .iter()
            .filter(|e| !matches!(e, ParseError::NoPlayableNotes))
            .count();
        assert_eq!(schedule.len() + symbol_errors, symbol_count(&text), "text: {:?}", text);

        let ticks: u64 = schedule.tokens().iter().map(|t| t.duration_ticks() as u64).sum();
        assert_eq!(ticks, schedule.total_ticks());
        assert!(schedule.tokens().iter().all(|t| t.duration_ticks() > 0));
        assert_eq!(schedule.is_empty(), errors.entries().contains(&ParseError::NoPlayableNotes));

        // Same text, same result
        assert_eq!(parse_with_limits(&text, &unlimited), (schedule, errors));
    }
}

/// Well-formed symbols mixed with garbage
#[test]
fn fuzz_parser_valid_symbols() {
    let mut rng = rand::thread_rng();
    let letters = [('C', 0), ('D', 2), ('E', 4), ('F', 5), ('G', 7), ('A', 9), ('B', 11)];
    let accidentals = [("", 0), ("#", 1), ("b", -1), ("s", 1), ("n", 0)];

    for _ in 0..500 {
        let mut symbols = Vec::new();
        let mut expected_midi = Vec::new();
        let mut valid = 0;
        for _ in 0..rng.gen_range(1..40) {
            if rng.gen_bool(0.8) {
                let (letter, semitone) = letters[rng.gen_range(0..letters.len())];
                let (accidental, shift) = accidentals[rng.gen_range(0..accidentals.len())];
                let octave: i32 = rng.gen_range(1..=7);
                let ticks = rng.gen_range(1..=4);
                symbols.push(format!("{}{}{}:{}", letter, accidental, octave, ticks));
                expected_midi.push((octave + 1) * 12 + semitone + shift);
                valid += 1;
            } else {
                symbols.push("%%".to_string());
            }
        }

        let text = symbols.join(" ");
        let (schedule, errors) = parse(&text);
        assert_eq!(schedule.len(), valid);
        assert!(schedule.tokens().iter().all(|t| !t.is_rest()));

        // Valid symbols keep their text order
        let midi: Vec<i32> = schedule
            .tokens()
            .iter()
            .filter_map(|t| t.sounding_pitch())
            .map(|p| i32::from(p.midi()))
            .collect();
        assert_eq!(midi, expected_midi, "text: {:?}", text);
        assert_eq!(symbols.len() - valid, errors.len() - usize::from(valid == 0));
    }
}

/// Limits hold for any input
#[test]
fn fuzz_parser_limits() {
    let mut rng = rand::thread_rng();

    for _ in 0..500 {
        let limits = ParserLimits {
            max_tokens: rng.gen_range(1..20),
            max_ticks: rng.gen_range(1..40),
        };
        let text = random_text(&mut rng, 200);
        let (schedule, errors) = parse_with_limits(&text, &limits);

        assert!(schedule.len() <= limits.max_tokens);
        assert!(schedule.total_ticks() <= limits.max_ticks);
        let truncations = errors
            .entries()
            .iter()
            .filter(|e| matches!(e, ParseError::Truncated { .. }))
            .count();
        assert!(truncations <= 1);
    }
}

/// Very long input is truncated, not rejected
#[test]
fn fuzz_parser_oversized_input() {
    let text = "C4 ".repeat(10_000);
    let (schedule, errors) = parse(&text);
    assert_eq!(schedule.len(), ParserLimits::default().max_tokens);
    assert_eq!(errors.len(), 1);
}
