//! Melody corpus encoding for sequence models.
//!
//! Turns named monophonic melodies (parallel pitch and duration events) into
//! front-padded one-hot tensors, with deterministic vocabularies and a JSON
//! raw form that round-trips losslessly.
//!
//! # Example
//!
//! ```
//! use melody_corpus::{from_json_str, MinLength};
//!
//! let json = r#"{
//!     "a": {"pitches": [60, 62, 64], "durations": [4, 4, 8]},
//!     "b": {"pitches": [60], "durations": [4]}
//! }"#;
//!
//! let corpus = from_json_str(json).unwrap();
//! assert_eq!(corpus.max_length().unwrap(), 3);
//! assert_eq!(corpus.pitch_vocabulary().values(), &[60, 62, 64]);
//!
//! let tensors = corpus.training_tensors().unwrap();
//! assert_eq!(tensors.pitches.dim(), (2, 3, 3));
//!
//! let long_only = corpus.filter(&MinLength(2)).unwrap();
//! assert_eq!(long_only.len(), 1);
//! ```

pub mod corpus;
pub mod error;
pub mod key;
pub mod melody;
pub mod persist;
pub mod stats;
pub mod strategy;
pub mod vocab;

pub use corpus::{stack_training_tensors, Corpus, Mappings, TrainingTensors};
pub use error::{CorpusError, Result, Stream};
pub use key::{reference_offset, KeyAnalyzer, KeyDetection, KeyMode, ProfileKeyAnalyzer};
pub use melody::{EncodedMelody, IndexedMelody, RawEvents, RawMelody, StandardizedMelody};
pub use persist::{from_json_str, load, load_lazy, load_raw, save, to_json_string, RawDocument};
pub use stats::CorpusStats;
pub use strategy::{
    AllowedDurations, ExcludeNames, MaxLength, MelodyFilter, MelodyTransform, MinLength, Transpose,
};
pub use vocab::{build_mappings, Vocabulary};
