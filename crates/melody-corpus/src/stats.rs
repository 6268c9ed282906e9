//! Summary statistics over a corpus's members and vocabularies.

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;

/// Summary of a corpus, for inspection before training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub melody_count: usize,
    pub total_events: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
    pub pitch_min: i32,
    pub pitch_max: i32,
    pub pitch_vocabulary_size: usize,
    pub duration_vocabulary_size: usize,
}

impl CorpusStats {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let melodies = corpus.melodies();
        let total_events: usize = melodies.iter().map(|m| m.length()).sum();

        let mean_length = if melodies.is_empty() {
            0.0
        } else {
            total_events as f64 / melodies.len() as f64
        };

        // The vocabulary is sorted, so its ends are the pitch range
        let pitches = corpus.pitch_vocabulary().values();

        Self {
            melody_count: melodies.len(),
            total_events,
            min_length: melodies.iter().map(|m| m.length()).min().unwrap_or(0),
            max_length: melodies.iter().map(|m| m.length()).max().unwrap_or(0),
            mean_length,
            pitch_min: pitches.first().copied().unwrap_or(0),
            pitch_max: pitches.last().copied().unwrap_or(0),
            pitch_vocabulary_size: corpus.pitch_vocabulary_size(),
            duration_vocabulary_size: corpus.duration_vocabulary_size(),
        }
    }
}

impl std::fmt::Display for CorpusStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "melodies:        {}", self.melody_count)?;
        writeln!(f, "events:          {}", self.total_events)?;
        writeln!(
            f,
            "length:          min {} / mean {:.1} / max {}",
            self.min_length, self.mean_length, self.max_length
        )?;
        writeln!(f, "pitch range:     {}..={}", self.pitch_min, self.pitch_max)?;
        writeln!(f, "pitch vocab:     {}", self.pitch_vocabulary_size)?;
        write!(f, "duration vocab:  {}", self.duration_vocabulary_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melody::RawMelody;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_corpus_stats_are_zero() {
        let stats = Corpus::new(vec![]).unwrap().stats();
        assert_eq!(stats.melody_count, 0);
        assert_eq!(stats.total_events, 0);
        assert_eq!(stats.mean_length, 0.0);
        assert_eq!(stats.pitch_min, 0);
        assert_eq!(stats.pitch_max, 0);
    }

    #[test]
    fn stats_summarize_members() {
        let corpus = Corpus::new(vec![
            RawMelody::new("a", vec![60, 62, 64], vec![4, 4, 8]).unwrap(),
            RawMelody::new("b", vec![55], vec![4]).unwrap(),
        ])
        .unwrap();

        assert_eq!(
            corpus.stats(),
            CorpusStats {
                melody_count: 2,
                total_events: 4,
                min_length: 1,
                max_length: 3,
                mean_length: 2.0,
                pitch_min: 55,
                pitch_max: 64,
                pitch_vocabulary_size: 4,
                duration_vocabulary_size: 2,
            }
        );
    }
}
