//! The corpus aggregate: named melodies plus their pitch and duration vocabularies.
//!
//! A corpus is immutable once built. Every derived corpus (filter, map,
//! transposition, removal) goes through [`Corpus::from_members`], which
//! recomputes both vocabularies from the new member set before anything is
//! encoded against them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::{s, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CorpusError, Result};
use crate::key::{reference_offset, KeyAnalyzer};
use crate::melody::{EncodedMelody, IndexedMelody, RawMelody, StandardizedMelody};
use crate::persist::RawDocument;
use crate::stats::CorpusStats;
use crate::strategy::{MelodyFilter, MelodyTransform};
use crate::vocab::{build_mappings, Vocabulary};

/// Stacked one-hot tensors shaped (melodies × timesteps × vocabulary size).
///
/// Zero rows are padding. Building next-step input/target pairs is left to
/// the trainer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTensors {
    pub pitches: Array3<f32>,
    pub durations: Array3<f32>,
}

/// Index → value views of both vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mappings {
    pub pitches: BTreeMap<usize, i32>,
    pub durations: BTreeMap<usize, i32>,
}

#[derive(Debug, Clone)]
struct Encodings {
    max_length: usize,
    standardized: Vec<StandardizedMelody>,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    melodies: Vec<RawMelody>,
    by_name: HashMap<String, usize>,
    pitch_vocabulary: Vocabulary,
    duration_vocabulary: Vocabulary,
    encodings: Option<Encodings>,
}

impl Corpus {
    /// Build a corpus from a raw document.
    ///
    /// With `build_encodings`, every member is integer-encoded, expanded to
    /// one-hot matrices and standardized to the longest member's length.
    pub fn construct(document: RawDocument, build_encodings: bool) -> Result<Self> {
        let melodies = document
            .into_iter()
            .map(|(name, events)| RawMelody::from_events(name, events))
            .collect::<Result<Vec<_>>>()?;
        Self::from_members(melodies, build_encodings)
    }

    /// Build a corpus without encodings.
    pub fn new(melodies: Vec<RawMelody>) -> Result<Self> {
        Self::from_members(melodies, false)
    }

    /// Single construction path for every corpus, original or derived.
    pub fn from_members(melodies: Vec<RawMelody>, build_encodings: bool) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(melodies.len());
        for (i, melody) in melodies.iter().enumerate() {
            if by_name.insert(melody.name().to_string(), i).is_some() {
                return Err(CorpusError::DuplicateName(melody.name().to_string()));
            }
        }

        let (pitch_vocabulary, duration_vocabulary) = build_vocabularies(&melodies);

        let encodings = if build_encodings {
            Some(encode_all(&melodies, &pitch_vocabulary, &duration_vocabulary)?)
        } else {
            None
        };

        info!(
            melodies = melodies.len(),
            pitch_vocabulary = pitch_vocabulary.len(),
            duration_vocabulary = duration_vocabulary.len(),
            encoded = encodings.is_some(),
            "built corpus"
        );

        Ok(Self {
            melodies,
            by_name,
            pitch_vocabulary,
            duration_vocabulary,
            encodings,
        })
    }

    /// The same members with every encoding built.
    pub fn with_encodings(&self) -> Result<Self> {
        if self.encodings.is_some() {
            return Ok(self.clone());
        }
        let encodings = encode_all(&self.melodies, &self.pitch_vocabulary, &self.duration_vocabulary)?;
        Ok(Self {
            encodings: Some(encodings),
            ..self.clone()
        })
    }

    pub fn has_encodings(&self) -> bool {
        self.encodings.is_some()
    }

    pub fn len(&self) -> usize {
        self.melodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.melodies.is_empty()
    }

    /// Members in construction order.
    pub fn melodies(&self) -> &[RawMelody] {
        &self.melodies
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.melodies.iter().map(RawMelody::name)
    }

    pub fn lookup(&self, name: &str) -> Option<&RawMelody> {
        self.by_name.get(name).map(|&i| &self.melodies[i])
    }

    /// A member's standardized matrices, if encodings were built.
    pub fn standardized(&self, name: &str) -> Option<&StandardizedMelody> {
        let i = *self.by_name.get(name)?;
        self.encodings.as_ref().map(|e| &e.standardized[i])
    }

    pub fn pitch_vocabulary(&self) -> &Vocabulary {
        &self.pitch_vocabulary
    }

    pub fn duration_vocabulary(&self) -> &Vocabulary {
        &self.duration_vocabulary
    }

    pub fn pitch_vocabulary_size(&self) -> usize {
        self.pitch_vocabulary.len()
    }

    pub fn duration_vocabulary_size(&self) -> usize {
        self.duration_vocabulary.len()
    }

    pub fn mappings(&self) -> Mappings {
        Mappings {
            pitches: self.pitch_vocabulary.to_index_map(),
            durations: self.duration_vocabulary.to_index_map(),
        }
    }

    /// Longest member length. Undefined for an empty corpus.
    pub fn max_length(&self) -> Result<usize> {
        self.melodies
            .iter()
            .map(RawMelody::length)
            .max()
            .ok_or(CorpusError::EmptyCorpus)
    }

    /// Stack every member's standardized matrices in member order.
    pub fn training_tensors(&self) -> Result<TrainingTensors> {
        let first = self.melodies.first().ok_or(CorpusError::EmptyCorpus)?;
        let encodings = self
            .encodings
            .as_ref()
            .ok_or_else(|| CorpusError::UnstandardizedMelody {
                name: first.name().to_string(),
            })?;

        stack(
            &encodings.standardized,
            encodings.max_length,
            self.pitch_vocabulary.len(),
            self.duration_vocabulary.len(),
        )
    }

    /// Raw symbolic form, in member order.
    pub fn raw_form(&self) -> RawDocument {
        self.melodies
            .iter()
            .map(|m| (m.name(), m.raw_events()))
            .collect()
    }

    /// Every member encoded against this corpus's vocabularies.
    pub fn integer_form(&self) -> Result<Vec<IndexedMelody>> {
        self.melodies
            .iter()
            .map(|m| m.encode_integers(&self.pitch_vocabulary, &self.duration_vocabulary))
            .collect()
    }

    /// Durations of all members, flattened in member order.
    pub fn all_durations(&self) -> Vec<i32> {
        self.melodies
            .iter()
            .flat_map(|m| m.durations().iter().copied())
            .collect()
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats::from_corpus(self)
    }

    /// New corpus of the members `filter` accepts.
    pub fn filter(&self, filter: &dyn MelodyFilter) -> Result<Self> {
        let kept: Vec<RawMelody> = self
            .melodies
            .iter()
            .filter(|m| filter.accept(m))
            .cloned()
            .collect();
        debug!(before = self.len(), after = kept.len(), "filtered corpus");
        Self::from_members(kept, self.has_encodings())
    }

    /// New corpus with every member replaced by `transform`'s output.
    ///
    /// Output names must stay unique.
    pub fn map(&self, transform: &dyn MelodyTransform) -> Result<Self> {
        let mapped = self
            .melodies
            .iter()
            .map(|m| transform.apply(m))
            .collect::<Result<Vec<_>>>()?;
        Self::from_members(mapped, self.has_encodings())
    }

    pub fn remove_by_name(&self, name: &str) -> Result<Self> {
        self.filter(&|m: &RawMelody| m.name() != name)
    }

    /// New corpus with each member moved to C major or A minor.
    ///
    /// Members the analyzer cannot place are left out.
    pub fn transpose_to_reference_key(&self, analyzer: &dyn KeyAnalyzer) -> Result<Self> {
        let mut transposed = Vec::with_capacity(self.len());
        for melody in &self.melodies {
            match analyzer.detect_key(melody) {
                Some(key) => {
                    let offset = reference_offset(&key);
                    debug!(melody = melody.name(), %key, offset, "transposing");
                    transposed.push(melody.transposed(offset)?);
                }
                None => {
                    warn!(melody = melody.name(), "key analysis failed, dropping melody");
                }
            }
        }
        Self::from_members(transposed, self.has_encodings())
    }

    /// Draw `n` members with replacement, reproducibly from `seed`.
    pub fn sample(&self, n: usize, seed: u64) -> Vec<&RawMelody> {
        if self.melodies.is_empty() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| &self.melodies[rng.random_range(0..self.melodies.len())])
            .collect()
    }
}

fn build_vocabularies(melodies: &[RawMelody]) -> (Vocabulary, Vocabulary) {
    let mut pitches = BTreeSet::new();
    let mut durations = BTreeSet::new();
    for melody in melodies {
        pitches.extend(melody.extract_pitch_values());
        durations.extend(melody.extract_duration_values());
    }
    (build_mappings(&pitches), build_mappings(&durations))
}

/// Encode members in parallel. Vocabularies are shared read-only; output
/// order matches input order.
fn encode_all(
    melodies: &[RawMelody],
    pitch_vocab: &Vocabulary,
    duration_vocab: &Vocabulary,
) -> Result<Encodings> {
    let encoded = melodies
        .par_iter()
        .map(|m| -> Result<EncodedMelody> {
            m.encode_integers(pitch_vocab, duration_vocab)?
                .encode_onehot(pitch_vocab.len(), duration_vocab.len())
        })
        .collect::<Result<Vec<_>>>()?;

    let max_length = encoded.iter().map(EncodedMelody::length).max().unwrap_or(0);
    let standardized = encoded
        .par_iter()
        .map(|e| e.standardize(max_length))
        .collect();

    debug!(melodies = melodies.len(), max_length, "encoded corpus");
    Ok(Encodings {
        max_length,
        standardized,
    })
}

/// Stack standardized melodies into training tensors.
///
/// Every member must be `length × width` for both streams; anything else is a
/// [`CorpusError::ShapeMismatch`] rather than ragged output.
pub fn stack_training_tensors(members: &[StandardizedMelody]) -> Result<TrainingTensors> {
    let first = members.first().ok_or(CorpusError::EmptyCorpus)?;
    stack(
        members,
        first.length(),
        first.pitches().ncols(),
        first.durations().ncols(),
    )
}

fn stack(
    members: &[StandardizedMelody],
    length: usize,
    pitch_width: usize,
    duration_width: usize,
) -> Result<TrainingTensors> {
    if members.is_empty() {
        return Err(CorpusError::EmptyCorpus);
    }

    let mut pitches = Array3::zeros((members.len(), length, pitch_width));
    let mut durations = Array3::zeros((members.len(), length, duration_width));

    for (i, member) in members.iter().enumerate() {
        check_shape(member, member.pitches().dim(), (length, pitch_width))?;
        check_shape(member, member.durations().dim(), (length, duration_width))?;
        pitches.slice_mut(s![i, .., ..]).assign(member.pitches());
        durations.slice_mut(s![i, .., ..]).assign(member.durations());
    }

    Ok(TrainingTensors { pitches, durations })
}

fn check_shape(
    member: &StandardizedMelody,
    actual: (usize, usize),
    expected: (usize, usize),
) -> Result<()> {
    if actual != expected {
        return Err(CorpusError::ShapeMismatch {
            name: member.name().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
