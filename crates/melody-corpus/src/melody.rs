//! A melody and its encoding stages.
//!
//! Each stage is its own immutable type and can only be produced from the
//! stage before it:
//!
//! ```text
//! RawMelody ──encode_integers──▶ IndexedMelody ──encode_onehot──▶ EncodedMelody ──standardize──▶ StandardizedMelody
//! ```
//!
//! Standardization pads and truncates at the front. Padding rows are all
//! zero and act as the mask value for sequence models reading left to right.

use std::collections::BTreeSet;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result, Stream};
use crate::vocab::Vocabulary;

/// The persisted form of one melody: two parallel event arrays.
///
/// `P`/`T` are accepted on input as short names for the two arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvents {
    #[serde(alias = "P")]
    pub pitches: Vec<i32>,
    #[serde(alias = "T")]
    pub durations: Vec<i32>,
}

/// A named melody as raw symbolic events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMelody {
    name: String,
    pitches: Vec<i32>,
    durations: Vec<i32>,
}

impl RawMelody {
    /// Create a melody. Fails if the two event sequences differ in length.
    pub fn new(name: impl Into<String>, pitches: Vec<i32>, durations: Vec<i32>) -> Result<Self> {
        let name = name.into();
        if pitches.len() != durations.len() {
            return Err(CorpusError::InvalidMelody {
                name,
                pitches: pitches.len(),
                durations: durations.len(),
            });
        }
        Ok(Self {
            name,
            pitches,
            durations,
        })
    }

    pub fn from_events(name: impl Into<String>, events: RawEvents) -> Result<Self> {
        Self::new(name, events.pitches, events.durations)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of events.
    pub fn length(&self) -> usize {
        self.pitches.len()
    }

    pub fn pitches(&self) -> &[i32] {
        &self.pitches
    }

    pub fn durations(&self) -> &[i32] {
        &self.durations
    }

    pub fn extract_pitch_values(&self) -> BTreeSet<i32> {
        self.pitches.iter().copied().collect()
    }

    pub fn extract_duration_values(&self) -> BTreeSet<i32> {
        self.durations.iter().copied().collect()
    }

    /// True when every duration is a member of `allowed`.
    pub fn durations_within(&self, allowed: &BTreeSet<i32>) -> bool {
        self.durations.iter().all(|d| allowed.contains(d))
    }

    pub fn raw_events(&self) -> RawEvents {
        RawEvents {
            pitches: self.pitches.clone(),
            durations: self.durations.clone(),
        }
    }

    /// Shift every pitch by `offset` semitones. Durations are untouched.
    pub fn transposed(&self, offset: i32) -> Result<RawMelody> {
        let pitches = self
            .pitches
            .iter()
            .map(|&pitch| {
                pitch
                    .checked_add(offset)
                    .ok_or_else(|| CorpusError::PitchOverflow {
                        name: self.name.clone(),
                        pitch,
                        offset,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawMelody {
            name: self.name.clone(),
            pitches,
            durations: self.durations.clone(),
        })
    }

    /// Replace each event with its vocabulary index.
    ///
    /// A value missing from either vocabulary is an error; nothing is mapped
    /// to a placeholder.
    pub fn encode_integers(
        &self,
        pitch_vocab: &Vocabulary,
        duration_vocab: &Vocabulary,
    ) -> Result<IndexedMelody> {
        Ok(IndexedMelody {
            name: self.name.clone(),
            pitches: self.lookup(Stream::Pitch, &self.pitches, pitch_vocab)?,
            durations: self.lookup(Stream::Duration, &self.durations, duration_vocab)?,
        })
    }

    fn lookup(&self, stream: Stream, values: &[i32], vocab: &Vocabulary) -> Result<Vec<usize>> {
        values
            .iter()
            .map(|&value| {
                vocab
                    .index_of(value)
                    .ok_or_else(|| CorpusError::OutOfVocabulary {
                        name: self.name.clone(),
                        stream,
                        value,
                    })
            })
            .collect()
    }
}

/// A melody whose events are vocabulary indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedMelody {
    name: String,
    pitches: Vec<usize>,
    durations: Vec<usize>,
}

impl IndexedMelody {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> usize {
        self.pitches.len()
    }

    pub fn pitches(&self) -> &[usize] {
        &self.pitches
    }

    pub fn durations(&self) -> &[usize] {
        &self.durations
    }

    /// Expand indices into one-hot rows of the given widths.
    pub fn encode_onehot(&self, pitch_width: usize, duration_width: usize) -> Result<EncodedMelody> {
        Ok(EncodedMelody {
            name: self.name.clone(),
            pitches: one_hot(&self.name, Stream::Pitch, &self.pitches, pitch_width)?,
            durations: one_hot(&self.name, Stream::Duration, &self.durations, duration_width)?,
        })
    }
}

fn one_hot(name: &str, stream: Stream, indices: &[usize], width: usize) -> Result<Array2<f32>> {
    let mut matrix = Array2::zeros((indices.len(), width));
    for (row, &index) in indices.iter().enumerate() {
        if index >= width {
            return Err(CorpusError::IndexOutOfRange {
                name: name.to_string(),
                stream,
                index,
                width,
            });
        }
        matrix[[row, index]] = 1.0;
    }
    Ok(matrix)
}

/// A melody as two one-hot matrices (events × vocabulary size).
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMelody {
    name: String,
    pitches: Array2<f32>,
    durations: Array2<f32>,
}

impl EncodedMelody {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> usize {
        self.pitches.nrows()
    }

    pub fn pitches(&self) -> &Array2<f32> {
        &self.pitches
    }

    pub fn durations(&self) -> &Array2<f32> {
        &self.durations
    }

    /// Pad or truncate both matrices to exactly `target_length` rows.
    ///
    /// Shorter melodies get zero rows prepended; longer ones lose their
    /// earliest events.
    pub fn standardize(&self, target_length: usize) -> StandardizedMelody {
        StandardizedMelody {
            name: self.name.clone(),
            events: self.length().min(target_length),
            pitches: fit_front(&self.pitches, target_length),
            durations: fit_front(&self.durations, target_length),
        }
    }
}

fn fit_front(matrix: &Array2<f32>, target_length: usize) -> Array2<f32> {
    let (rows, width) = matrix.dim();
    let mut fitted = Array2::zeros((target_length, width));
    if rows >= target_length {
        fitted.assign(&matrix.slice(s![rows - target_length.., ..]));
    } else {
        fitted
            .slice_mut(s![target_length - rows.., ..])
            .assign(matrix);
    }
    fitted
}

/// A melody padded/truncated to a corpus-wide length, ready for stacking.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedMelody {
    name: String,
    events: usize,
    pitches: Array2<f32>,
    durations: Array2<f32>,
}

impl StandardizedMelody {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows, padding included.
    pub fn length(&self) -> usize {
        self.pitches.nrows()
    }

    /// Number of rows that hold real events.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Number of leading mask rows.
    pub fn padding(&self) -> usize {
        self.length() - self.events
    }

    pub fn pitches(&self) -> &Array2<f32> {
        &self.pitches
    }

    pub fn durations(&self) -> &Array2<f32> {
        &self.durations
    }
}
