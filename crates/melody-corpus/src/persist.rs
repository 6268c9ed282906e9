//! JSON persistence of a corpus's raw form.
//!
//! The document is `{name: {"pitches": [...], "durations": [...]}}`. Derived
//! encodings are never written; loading rebuilds them.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::corpus::Corpus;
use crate::error::{CorpusError, Result};
use crate::melody::RawEvents;

/// Named raw melodies in document order.
///
/// Duplicate names are kept here so corpus construction can reject them
/// instead of a map silently keeping the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    entries: Vec<(String, RawEvents)>,
}

impl RawDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, events: RawEvents) {
        self.entries.push((name.into(), events));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RawEvents> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, events)| events)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawEvents)> {
        self.entries.iter().map(|(name, events)| (name.as_str(), events))
    }

    /// Name-keyed view, for comparisons that ignore document order.
    pub fn to_map(&self) -> BTreeMap<String, RawEvents> {
        self.entries.iter().cloned().collect()
    }

    /// Reject entries whose arrays differ in length.
    pub fn validate(&self) -> Result<()> {
        for (name, events) in &self.entries {
            if events.pitches.len() != events.durations.len() {
                return Err(CorpusError::MalformedDocument(format!(
                    "melody {name:?} has {} pitches but {} durations",
                    events.pitches.len(),
                    events.durations.len()
                )));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, RawEvents)> for RawDocument {
    fn from_iter<I: IntoIterator<Item = (S, RawEvents)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, e)| (n.into(), e)).collect(),
        }
    }
}

impl IntoIterator for RawDocument {
    type Item = (String, RawEvents);
    type IntoIter = std::vec::IntoIter<(String, RawEvents)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for RawDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, events) in &self.entries {
            map.serialize_entry(name, events)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RawDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping melody names to pitch/duration arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RawDocument, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, events)) = access.next_entry::<String, RawEvents>()? {
                    entries.push((name, events));
                }
                Ok(RawDocument { entries })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Serialize the corpus's raw form to a JSON string.
pub fn to_json_string(corpus: &Corpus) -> Result<String> {
    serde_json::to_string(&corpus.raw_form())
        .map_err(|e| CorpusError::MalformedDocument(e.to_string()))
}

/// Parse a JSON document and build a fully encoded corpus.
pub fn from_json_str(json: &str) -> Result<Corpus> {
    let document: RawDocument =
        serde_json::from_str(json).map_err(|e| CorpusError::MalformedDocument(e.to_string()))?;
    document.validate()?;
    Corpus::construct(document, true)
}

/// Write the raw form of `corpus` to `path`.
pub fn save(corpus: &Corpus, path: &Path) -> Result<()> {
    let io_err = |source: std::io::Error| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &corpus.raw_form()).map_err(|e| io_err(e.into()))?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), melodies = corpus.len(), "saved corpus");
    Ok(())
}

/// Read and validate a corpus document from `path` without building a corpus.
pub fn load_raw(path: &Path) -> Result<RawDocument> {
    let file = File::open(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document: RawDocument =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                CorpusError::Io {
                    path: path.to_path_buf(),
                    source: e.into(),
                }
            } else {
                CorpusError::MalformedDocument(format!("{}: {}", path.display(), e))
            }
        })?;
    document.validate()?;
    Ok(document)
}

/// Read a corpus document from `path` with vocabularies only.
///
/// Encodings are left unbuilt; call [`Corpus::with_encodings`] before
/// asking for tensors.
pub fn load_lazy(path: &Path) -> Result<Corpus> {
    let corpus = Corpus::construct(load_raw(path)?, false)?;
    info!(path = %path.display(), melodies = corpus.len(), "loaded corpus");
    Ok(corpus)
}

/// Read a corpus document from `path`, rebuilding vocabularies and encodings.
pub fn load(path: &Path) -> Result<Corpus> {
    let corpus = Corpus::construct(load_raw(path)?, true)?;
    info!(path = %path.display(), melodies = corpus.len(), "loaded corpus");
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_keeps_order() {
        let json = r#"{"z": {"pitches": [1], "durations": [2]}, "a": {"pitches": [3], "durations": [4]}}"#;
        let doc: RawDocument = serde_json::from_str(json).unwrap();
        let names: Vec<_> = doc.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn document_serializes_as_object() {
        let doc: RawDocument = [(
            "a",
            RawEvents {
                pitches: vec![60, 62],
                durations: vec![4, 8],
            },
        )]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"a":{"pitches":[60,62],"durations":[4,8]}}"#);
    }

    #[test]
    fn short_keys_accepted() {
        let json = r#"{"tune": {"P": [60, 62], "T": [4, 8]}}"#;
        let doc: RawDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.get("tune").unwrap().pitches, vec![60, 62]);
        assert_eq!(doc.get("tune").unwrap().durations, vec![4, 8]);
    }

    #[test]
    fn missing_key_is_malformed() {
        let err = from_json_str(r#"{"a": {"pitches": [60]}}"#).unwrap_err();
        assert!(matches!(err, CorpusError::MalformedDocument(_)), "{err}");
    }

    #[test]
    fn non_integer_value_is_malformed() {
        let err = from_json_str(r#"{"a": {"pitches": [60.5], "durations": [4]}}"#).unwrap_err();
        assert!(matches!(err, CorpusError::MalformedDocument(_)), "{err}");
    }

    #[test]
    fn mismatched_arrays_are_malformed() {
        let err = from_json_str(r#"{"a": {"pitches": [60, 62], "durations": [4]}}"#).unwrap_err();
        assert!(matches!(err, CorpusError::MalformedDocument(_)), "{err}");
    }

    #[test]
    fn duplicate_names_rejected() {
        let json = r#"{"a": {"pitches": [60], "durations": [4]}, "a": {"pitches": [62], "durations": [4]}}"#;
        let err = from_json_str(json).unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateName(ref n) if n == "a"), "{err}");
    }

    #[test]
    fn not_an_object_is_malformed() {
        let err = from_json_str("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CorpusError::MalformedDocument(_)), "{err}");
    }

    #[test]
    fn string_round_trip() {
        let json = r#"{"a":{"pitches":[60,62,64],"durations":[4,4,8]},"b":{"pitches":[60],"durations":[4]}}"#;
        let corpus = from_json_str(json).unwrap();
        assert_eq!(to_json_string(&corpus).unwrap(), json);
    }

    #[test]
    fn lazy_load_skips_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            r#"{"a": {"pitches": [60, 62], "durations": [4, 8]}, "b": {"P": [64], "T": [4]}}"#,
        )
        .unwrap();

        let raw = load_raw(&path).unwrap();
        assert_eq!(raw.len(), 2);

        let lazy = load_lazy(&path).unwrap();
        assert!(!lazy.has_encodings());
        assert_eq!(lazy.pitch_vocabulary().values(), &[60, 62, 64]);
        assert_eq!(lazy.raw_form(), raw);

        let derived = lazy.filter(&|m: &crate::melody::RawMelody| m.length() > 1).unwrap();
        assert!(!derived.has_encodings());
    }

    #[test]
    fn lazy_load_still_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"a": {"pitches": [60, 62], "durations": [4]}}"#).unwrap();
        assert!(matches!(load_raw(&path), Err(CorpusError::MalformedDocument(_))));
        assert!(matches!(load_lazy(&path), Err(CorpusError::MalformedDocument(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }), "{err}");
    }
}
