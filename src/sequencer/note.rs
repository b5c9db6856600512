// Note representation for the sequencer
// A token is either a pitched note or a rest, lasting a whole number of ticks

use std::fmt;

/// Pitch classes, sharps only. Flats are folded into the sharp below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitone offset from C (C=0, C#=1, ... B=11)
    pub fn semitone(&self) -> u8 {
        *self as u8
    }

    /// Pitch class for a semitone offset, wrapping modulo 12
    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    /// Natural pitch class for a letter name (case-insensitive)
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(PitchClass::C),
            'D' => Some(PitchClass::D),
            'E' => Some(PitchClass::E),
            'F' => Some(PitchClass::F),
            'G' => Some(PitchClass::G),
            'A' => Some(PitchClass::A),
            'B' => Some(PitchClass::B),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        NOTE_NAMES[self.semitone() as usize]
    }
}

/// A concrete pitch: MIDI note number (0-127, where 60 = C4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch(u8);

impl Pitch {
    /// Lowest octave accepted by the notation
    pub const MIN_OCTAVE: i8 = 0;
    /// Highest octave accepted by the notation
    pub const MAX_OCTAVE: i8 = 8;

    /// Build a pitch from a MIDI note number
    pub fn from_midi(midi: u8) -> Option<Self> {
        (midi <= 127).then_some(Self(midi))
    }

    /// Build a pitch from a pitch class, a semitone shift (accidental) and an octave.
    ///
    /// Returns `None` if the result falls outside the MIDI range.
    pub fn new(class: PitchClass, shift: i8, octave: i8) -> Option<Self> {
        let midi = (octave as i16 + 1) * 12 + class.semitone() as i16 + shift as i16;
        if (0..=127).contains(&midi) {
            Some(Self(midi as u8))
        } else {
            None
        }
    }

    pub fn midi(&self) -> u8 {
        self.0
    }

    pub fn class(&self) -> PitchClass {
        PitchClass::from_semitone(self.0 % 12)
    }

    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class().name(), self.octave())
    }
}

/// What a token does when its first tick comes round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Pitch(Pitch),
    Rest,
}

/// One parsed unit of a schedule
///
/// Duration is in scheduler ticks and is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteToken {
    kind: NoteKind,
    duration_ticks: u32,
}

impl NoteToken {
    /// Creates a new token
    pub fn new(kind: NoteKind, duration_ticks: u32) -> Self {
        assert!(duration_ticks > 0, "Note duration must be > 0");
        Self {
            kind,
            duration_ticks,
        }
    }

    pub fn pitch(pitch: Pitch, duration_ticks: u32) -> Self {
        Self::new(NoteKind::Pitch(pitch), duration_ticks)
    }

    pub fn rest(duration_ticks: u32) -> Self {
        Self::new(NoteKind::Rest, duration_ticks)
    }

    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    pub fn duration_ticks(&self) -> u32 {
        self.duration_ticks
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.kind, NoteKind::Rest)
    }

    /// Sounding pitch, `None` for rests
    pub fn sounding_pitch(&self) -> Option<Pitch> {
        match self.kind {
            NoteKind::Pitch(p) => Some(p),
            NoteKind::Rest => None,
        }
    }
}

impl fmt::Display for NoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::Pitch(p) => write!(f, "{}", p)?,
            NoteKind::Rest => write!(f, "R")?,
        }
        if self.duration_ticks != 1 {
            write!(f, ":{}", self.duration_ticks)?;
        }
        Ok(())
    }
}
