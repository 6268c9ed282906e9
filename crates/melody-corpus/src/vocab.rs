//! Value vocabularies: dense indices assigned to distinct symbolic values.
//!
//! Indices follow ascending value order, so the same value set always yields
//! the same mapping no matter the order melodies were discovered in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Bijection between indices `0..len` and a set of distinct values.
///
/// Serializes as the JSON array of values in index order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<i32>", try_from = "Vec<i32>")]
pub struct Vocabulary {
    index_to_value: Vec<i32>,
    value_to_index: HashMap<i32, usize>,
}

/// Build the vocabulary for a value set. Index 0 is the smallest value.
pub fn build_mappings(values: &BTreeSet<i32>) -> Vocabulary {
    // BTreeSet iterates in ascending order
    let index_to_value: Vec<i32> = values.iter().copied().collect();
    let value_to_index = index_to_value
        .iter()
        .enumerate()
        .map(|(index, &value)| (value, index))
        .collect();

    Vocabulary {
        index_to_value,
        value_to_index,
    }
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.index_to_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_value.is_empty()
    }

    /// Index for `value`, or `None` if the value was never observed.
    pub fn index_of(&self, value: i32) -> Option<usize> {
        self.value_to_index.get(&value).copied()
    }

    /// Value at `index`, or `None` if out of range.
    pub fn value_at(&self, index: usize) -> Option<i32> {
        self.index_to_value.get(index).copied()
    }

    /// Values in index order.
    pub fn values(&self) -> &[i32] {
        &self.index_to_value
    }

    /// Index → value view, as handed to trainers for decoding predictions.
    pub fn to_index_map(&self) -> BTreeMap<usize, i32> {
        self.index_to_value.iter().copied().enumerate().collect()
    }
}

impl From<Vocabulary> for Vec<i32> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.index_to_value
    }
}

impl TryFrom<Vec<i32>> for Vocabulary {
    type Error = String;

    fn try_from(values: Vec<i32>) -> Result<Self, Self::Error> {
        if let Some(pair) = values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "vocabulary values must be strictly ascending, found {} before {}",
                pair[0], pair[1]
            ));
        }
        Ok(build_mappings(&values.into_iter().collect()))
    }
}
