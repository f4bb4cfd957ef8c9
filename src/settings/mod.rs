// Settings module - user-facing metronome parameters and their persistence

pub mod shared;
pub mod store;

pub use shared::SharedSettings;
pub use store::{SettingsError, SettingsStore};

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_BEATS: u8 = 1;
pub const MAX_BEATS: u8 = 12;
pub const MIN_TEMPO: u16 = 33;
pub const MAX_TEMPO: u16 = 300;

/// Note value that gets one click
///
/// The stored value counts clicks per beat, so eighths click twice per beat
/// and a whole note clicks once every four beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum NoteSubdivision {
    Whole,
    Half,
    Quarter,
    Eighth,
}

/// Direction of a subdivision step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl NoteSubdivision {
    pub const ALL: [NoteSubdivision; 4] = [
        NoteSubdivision::Whole,
        NoteSubdivision::Half,
        NoteSubdivision::Quarter,
        NoteSubdivision::Eighth,
    ];

    /// Clicks per beat (0.25, 0.5, 1 or 2)
    pub fn value(&self) -> f64 {
        match self {
            NoteSubdivision::Whole => 0.25,
            NoteSubdivision::Half => 0.5,
            NoteSubdivision::Quarter => 1.0,
            NoteSubdivision::Eighth => 2.0,
        }
    }

    /// Multiplier applied to the base beat interval (60 / tempo)
    pub fn interval_multiplier(&self) -> f64 {
        1.0 / self.value()
    }

    /// Step to the neighbouring note value
    ///
    /// Returns `None` when already at the end of the table in that direction.
    pub fn step(&self, direction: Direction) -> Option<NoteSubdivision> {
        use Direction::{Down, Up};
        use NoteSubdivision::*;

        match (self, direction) {
            (Whole, Up) => Some(Half),
            (Whole, Down) => None,
            (Half, Up) => Some(Quarter),
            (Half, Down) => Some(Whole),
            (Quarter, Up) => Some(Eighth),
            (Quarter, Down) => Some(Half),
            (Eighth, Up) => None,
            (Eighth, Down) => Some(Quarter),
        }
    }

    pub(crate) fn index(&self) -> u8 {
        match self {
            NoteSubdivision::Whole => 0,
            NoteSubdivision::Half => 1,
            NoteSubdivision::Quarter => 2,
            NoteSubdivision::Eighth => 3,
        }
    }

    pub(crate) fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(NoteSubdivision::Quarter)
    }
}

impl TryFrom<f64> for NoteSubdivision {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .find(|note| (note.value() - value).abs() < f64::EPSILON)
            .copied()
            .ok_or_else(|| format!("invalid note value: {}", value))
    }
}

impl From<NoteSubdivision> for f64 {
    fn from(note: NoteSubdivision) -> Self {
        note.value()
    }
}

impl fmt::Display for NoteSubdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteSubdivision::Whole => "1/1",
            NoteSubdivision::Half => "1/2",
            NoteSubdivision::Quarter => "1/4",
            NoteSubdivision::Eighth => "1/8",
        };
        write!(f, "{}", name)
    }
}

/// Flat settings record: tempo, beats per measure and note subdivision
///
/// All fields are kept inside their bounds by construction; the adjust
/// helpers return `None` when a change would be a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSettings")]
pub struct MetronomeSettings {
    #[serde(rename = "beats")]
    pub beats_per_measure: u8,
    #[serde(rename = "note")]
    pub note_subdivision: NoteSubdivision,
    #[serde(rename = "bpm")]
    pub tempo: u16,
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self {
            beats_per_measure: 4,
            note_subdivision: NoteSubdivision::Quarter,
            tempo: 67,
        }
    }
}

/// Settings record as found on disk, before any bounds are applied
///
/// Numbers are read wide so hand-edited values outside the field types
/// (negative beats, huge or fractional tempos) still load.
#[derive(Deserialize)]
#[serde(default)]
struct StoredSettings {
    bpm: f64,
    beats: f64,
    note: f64,
}

impl Default for StoredSettings {
    fn default() -> Self {
        let defaults = MetronomeSettings::default();
        Self {
            bpm: defaults.tempo as f64,
            beats: defaults.beats_per_measure as f64,
            note: defaults.note_subdivision.value(),
        }
    }
}

fn round_into(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.round().clamp(min, max)
    } else {
        fallback
    }
}

impl From<StoredSettings> for MetronomeSettings {
    fn from(stored: StoredSettings) -> Self {
        let defaults = MetronomeSettings::default();
        let tempo = round_into(
            stored.bpm,
            MIN_TEMPO as f64,
            MAX_TEMPO as f64,
            defaults.tempo as f64,
        );
        let beats = round_into(
            stored.beats,
            MIN_BEATS as f64,
            MAX_BEATS as f64,
            defaults.beats_per_measure as f64,
        );
        Self {
            beats_per_measure: beats as u8,
            note_subdivision: NoteSubdivision::try_from(stored.note).unwrap_or(NoteSubdivision::Quarter),
            tempo: tempo as u16,
        }
    }
}

impl MetronomeSettings {
    /// Build settings, clamping every field into its bounds
    pub fn new(beats_per_measure: u8, note_subdivision: NoteSubdivision, tempo: u16) -> Self {
        Self {
            beats_per_measure,
            note_subdivision,
            tempo,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            beats_per_measure: self.beats_per_measure.clamp(MIN_BEATS, MAX_BEATS),
            note_subdivision: self.note_subdivision,
            tempo: self.tempo.clamp(MIN_TEMPO, MAX_TEMPO),
        }
    }

    /// Time between two consecutive clicks, in seconds
    pub fn beat_interval(&self) -> f64 {
        self.note_subdivision.interval_multiplier() * (60.0 / self.tempo as f64)
    }

    /// Beats change is ignored (not clamped) when it leaves [1, 12]
    pub fn with_beats_delta(&self, delta: i32) -> Option<Self> {
        let beats = self.beats_per_measure as i32 + delta;
        if delta == 0 || !(MIN_BEATS as i32..=MAX_BEATS as i32).contains(&beats) {
            return None;
        }
        Some(Self {
            beats_per_measure: beats as u8,
            ..*self
        })
    }

    /// Tempo change is clamped to [33, 300]
    pub fn with_tempo_delta(&self, delta: i32) -> Option<Self> {
        let tempo = (self.tempo as i32 + delta).clamp(MIN_TEMPO as i32, MAX_TEMPO as i32) as u16;
        if tempo == self.tempo {
            return None;
        }
        Some(Self { tempo, ..*self })
    }

    pub fn with_subdivision_step(&self, direction: Direction) -> Option<Self> {
        self.note_subdivision.step(direction).map(|note| Self {
            note_subdivision: note,
            ..*self
        })
    }
}
