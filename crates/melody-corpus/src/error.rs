use std::path::PathBuf;

/// Which of the two parallel event streams a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Pitch,
    Duration,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Pitch => write!(f, "pitch"),
            Stream::Duration => write!(f, "duration"),
        }
    }
}

/// Errors from corpus construction, encoding and persistence.
///
/// None of these are retried. They indicate either bad data or calls made in
/// the wrong order, and every failing operation leaves existing corpora untouched.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("invalid melody {name:?}: {pitches} pitches but {durations} durations")]
    InvalidMelody {
        name: String,
        pitches: usize,
        durations: usize,
    },

    #[error("melody {name:?}: {stream} value {value} is not in the vocabulary")]
    OutOfVocabulary {
        name: String,
        stream: Stream,
        value: i32,
    },

    #[error("melody {name:?}: {stream} index {index} does not fit a one-hot width of {width}")]
    IndexOutOfRange {
        name: String,
        stream: Stream,
        index: usize,
        width: usize,
    },

    #[error("melody {name:?}: pitch {pitch} shifted by {offset} overflows")]
    PitchOverflow {
        name: String,
        pitch: i32,
        offset: i32,
    },

    #[error("corpus has no melodies")]
    EmptyCorpus,

    #[error("melody {name:?} has not been standardized; build encodings first")]
    UnstandardizedMelody { name: String },

    #[error("melody {name:?} has matrix shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("malformed corpus document: {0}")]
    MalformedDocument(String),

    #[error("duplicate melody name {0:?}")]
    DuplicateName(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CorpusError>;
