//! Parser for the note notation
//!
//! Format: symbols separated by whitespace, `,` or `|` (bar lines).
//!
//! Symbols:
//! - Pitch: `<letter>[<accidental>][<octave>][:<ticks>]` (e.g. `C4`, `f#`, `Bb3:2`)
//! - Rest:  `R`, `r` or `-`, with an optional `:<ticks>`
//!
//! Notes:
//! - Letters: A-G, case-insensitive
//! - Accidentals: `#` or `s` (sharp), `b` (flat), `n` (natural)
//! - Octaves: 0-8. An omitted octave reuses the last one written, starting at 4
//! - Duration defaults to one tick
//!
//! Bad symbols never abort a parse. They are skipped and reported in the
//! returned [`ErrorLog`] with their 1-based position.

use crate::sequencer::note::{NoteToken, Pitch, PitchClass};
use crate::sequencer::pattern::Schedule;
use std::fmt;

/// Octave used until the text names one
pub const DEFAULT_OCTAVE: i8 = 4;

/// Bounds on a single parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParserLimits {
    /// Maximum number of tokens in a schedule
    pub max_tokens: usize,
    /// Maximum length of one pass, in ticks
    pub max_ticks: u64,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            max_ticks: 2048,
        }
    }
}

/// Which limit cut a composition short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Tokens(usize),
    Ticks(u64),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Tokens(max) => write!(f, "more than {} notes", max),
            Limit::Ticks(max) => write!(f, "longer than {} ticks", max),
        }
    }
}

/// Parse errors (per symbol, never fatal)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized token '{token}' at position {position}")]
    Unrecognized { token: String, position: usize },

    #[error("invalid duration in '{token}' at position {position}")]
    InvalidDuration { token: String, position: usize },

    #[error("octave out of range in '{token}' at position {position}")]
    OctaveOutOfRange { token: String, position: usize },

    #[error("composition truncated at position {position}: {limit}")]
    Truncated { limit: Limit, position: usize },

    #[error("no playable notes found")]
    NoPlayableNotes,
}

/// Errors from the last parse, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<ParseError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.entries.push(error);
    }

    pub fn entries(&self) -> &[ParseError] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Human-readable lines, one per error
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No errors.");
        }
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Why one symbol was rejected
enum SymbolError {
    Unrecognized,
    InvalidDuration,
    OctaveOutOfRange,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == '|'
}

/// Parse the duration suffix (the part after `:`)
fn parse_duration(s: Option<&str>) -> Result<u32, SymbolError> {
    match s {
        None => Ok(1),
        Some(digits) if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) => {
            Err(SymbolError::InvalidDuration)
        }
        Some(digits) => match digits.parse::<u32>() {
            Ok(0) | Err(_) => Err(SymbolError::InvalidDuration),
            Ok(ticks) => Ok(ticks),
        },
    }
}

/// Parse a single symbol
/// `octave` is the carried octave and is only updated on success
fn parse_symbol(symbol: &str, octave: &mut i8) -> Result<NoteToken, SymbolError> {
    let (head, duration) = match symbol.split_once(':') {
        Some((head, duration)) => (head, Some(duration)),
        None => (symbol, None),
    };

    if matches!(head, "R" | "r" | "-") {
        let ticks = parse_duration(duration)?;
        return Ok(NoteToken::rest(ticks));
    }

    let mut chars = head.chars().peekable();
    let class = chars
        .next()
        .and_then(PitchClass::from_letter)
        .ok_or(SymbolError::Unrecognized)?;

    let shift = match chars.peek().copied() {
        Some('#' | 's') => 1,
        Some('b') => -1,
        _ => 0,
    };
    if matches!(chars.peek(), Some('#' | 's' | 'b' | 'n')) {
        chars.next();
    }

    let explicit_octave = match chars.next() {
        None => None,
        Some(c) => Some(c.to_digit(10).ok_or(SymbolError::Unrecognized)? as i8),
    };
    if chars.next().is_some() {
        return Err(SymbolError::Unrecognized);
    }

    let ticks = parse_duration(duration)?;
    let octave_used = explicit_octave.unwrap_or(*octave);
    if !(Pitch::MIN_OCTAVE..=Pitch::MAX_OCTAVE).contains(&octave_used) {
        return Err(SymbolError::OctaveOutOfRange);
    }
    let pitch = Pitch::new(class, shift, octave_used).ok_or(SymbolError::OctaveOutOfRange)?;

    *octave = octave_used;
    Ok(NoteToken::pitch(pitch, ticks))
}

/// Parse full note text with the default limits
pub fn parse(text: &str) -> (Schedule, ErrorLog) {
    parse_with_limits(text, &ParserLimits::default())
}

/// Parse full note text
///
/// Returns the schedule of every valid token in text order, plus the errors
/// for everything that was skipped. Pure: the caller decides whether to commit.
pub fn parse_with_limits(text: &str, limits: &ParserLimits) -> (Schedule, ErrorLog) {
    let mut tokens = Vec::new();
    let mut errors = ErrorLog::new();
    let mut octave = DEFAULT_OCTAVE;
    let mut total_ticks: u64 = 0;

    let symbols = text.split(is_delimiter).filter(|s| !s.is_empty());

    for (index, symbol) in symbols.enumerate() {
        let position = index + 1;

        let token = match parse_symbol(symbol, &mut octave) {
            Ok(token) => token,
            Err(kind) => {
                let token = symbol.to_string();
                errors.push(match kind {
                    SymbolError::Unrecognized => ParseError::Unrecognized { token, position },
                    SymbolError::InvalidDuration => {
                        ParseError::InvalidDuration { token, position }
                    }
                    SymbolError::OctaveOutOfRange => {
                        ParseError::OctaveOutOfRange { token, position }
                    }
                });
                continue;
            }
        };

        if tokens.len() >= limits.max_tokens {
            errors.push(ParseError::Truncated {
                limit: Limit::Tokens(limits.max_tokens),
                position,
            });
            break;
        }
        if total_ticks + token.duration_ticks() as u64 > limits.max_ticks {
            errors.push(ParseError::Truncated {
                limit: Limit::Ticks(limits.max_ticks),
                position,
            });
            break;
        }

        total_ticks += token.duration_ticks() as u64;
        tokens.push(token);
    }

    if tokens.is_empty() {
        errors.push(ParseError::NoPlayableNotes);
    }

    (Schedule::from_tokens(tokens), errors)
}
