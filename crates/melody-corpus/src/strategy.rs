//! Filter and transform strategies for deriving new corpora.
//!
//! Closures work directly; the named types cover the common cases and can be
//! built from configuration.

use std::collections::{BTreeSet, HashSet};

use crate::error::Result;
use crate::melody::RawMelody;

/// Decides whether a melody belongs in a derived corpus.
pub trait MelodyFilter {
    fn accept(&self, melody: &RawMelody) -> bool;
}

impl<F> MelodyFilter for F
where
    F: Fn(&RawMelody) -> bool,
{
    fn accept(&self, melody: &RawMelody) -> bool {
        self(melody)
    }
}

/// Produces the replacement for a melody in a derived corpus.
pub trait MelodyTransform {
    fn apply(&self, melody: &RawMelody) -> Result<RawMelody>;
}

impl<F> MelodyTransform for F
where
    F: Fn(&RawMelody) -> Result<RawMelody>,
{
    fn apply(&self, melody: &RawMelody) -> Result<RawMelody> {
        self(melody)
    }
}

/// Keeps melodies with at least this many events.
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl MelodyFilter for MinLength {
    fn accept(&self, melody: &RawMelody) -> bool {
        melody.length() >= self.0
    }
}

/// Keeps melodies with at most this many events.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength(pub usize);

impl MelodyFilter for MaxLength {
    fn accept(&self, melody: &RawMelody) -> bool {
        melody.length() <= self.0
    }
}

/// Drops melodies by name.
#[derive(Debug, Clone, Default)]
pub struct ExcludeNames(pub HashSet<String>);

impl ExcludeNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl MelodyFilter for ExcludeNames {
    fn accept(&self, melody: &RawMelody) -> bool {
        !self.0.contains(melody.name())
    }
}

/// Keeps melodies whose every duration is in the allowed set.
#[derive(Debug, Clone, Default)]
pub struct AllowedDurations(pub BTreeSet<i32>);

impl MelodyFilter for AllowedDurations {
    fn accept(&self, melody: &RawMelody) -> bool {
        melody.durations_within(&self.0)
    }
}

/// Shifts every pitch by a fixed number of semitones.
#[derive(Debug, Clone, Copy)]
pub struct Transpose(pub i32);

impl MelodyTransform for Transpose {
    fn apply(&self, melody: &RawMelody) -> Result<RawMelody> {
        melody.transposed(self.0)
    }
}
