//! End-to-end tests: documents on disk through to training tensors.

use std::collections::BTreeMap;

use melody_corpus::{
    load, save, Corpus, CorpusError, KeyAnalyzer, KeyDetection, KeyMode, MinLength,
    ProfileKeyAnalyzer, RawDocument, RawEvents, RawMelody, Transpose,
};
use pretty_assertions::assert_eq;

fn events(pitches: &[i32], durations: &[i32]) -> RawEvents {
    RawEvents {
        pitches: pitches.to_vec(),
        durations: durations.to_vec(),
    }
}

fn folk_tunes() -> RawDocument {
    [
        ("sessiontune1", events(&[67, 71, 74, 71, 67, 62, 66, 67], &[8, 4, 4, 4, 8, 4, 2, 16])),
        ("sessiontune2", events(&[62, 64, 66, 67], &[4, 4, 4, 12])),
        ("sessiontune3", events(&[57, 60, 64, 69, 64], &[3, 3, 3, 6, 9])),
        ("sessiontune4", events(&[72], &[16])),
    ]
    .into_iter()
    .collect()
}

#[test]
fn save_then_load_reproduces_raw_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.json");

    let corpus = Corpus::construct(folk_tunes(), false).unwrap();
    save(&corpus, &path).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(loaded.raw_form(), corpus.raw_form());
    assert_eq!(loaded.raw_form().to_map(), folk_tunes().to_map());
    assert!(loaded.has_encodings(), "load builds encodings eagerly");
    assert_eq!(loaded.pitch_vocabulary(), corpus.pitch_vocabulary());
    assert_eq!(loaded.duration_vocabulary(), corpus.duration_vocabulary());
}

#[test]
fn loaded_tensors_match_freshly_built_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.json");

    let corpus = Corpus::construct(folk_tunes(), true).unwrap();
    save(&corpus, &path).unwrap();

    assert_eq!(
        load(&path).unwrap().training_tensors().unwrap(),
        corpus.training_tensors().unwrap()
    );
}

#[test]
fn persisted_file_holds_only_raw_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.json");

    save(&Corpus::construct(folk_tunes(), true).unwrap(), &path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 4);
    for entry in object.values() {
        let mut keys: Vec<_> = entry.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["durations".to_string(), "pitches".to_string()]);
    }
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"a": {"pitches": [60, 62], "durations": [4]}}"#).unwrap();

    assert!(matches!(load(&path), Err(CorpusError::MalformedDocument(_))));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load(&path), Err(CorpusError::MalformedDocument(_))));
}

#[test]
fn every_standardized_matrix_has_max_length_rows() {
    let corpus = Corpus::construct(folk_tunes(), true).unwrap();
    let max_length = corpus.max_length().unwrap();
    assert_eq!(max_length, 8);

    for melody in corpus.melodies() {
        let standardized = corpus.standardized(melody.name()).unwrap();
        assert_eq!(standardized.pitches().nrows(), max_length);
        assert_eq!(standardized.durations().nrows(), max_length);
        assert_eq!(standardized.padding(), max_length - melody.length());

        for (row, (p, d)) in standardized
            .pitches()
            .rows()
            .into_iter()
            .zip(standardized.durations().rows())
            .enumerate()
        {
            let expected = if row < standardized.padding() { 0.0 } else { 1.0 };
            assert_eq!(p.sum(), expected);
            assert_eq!(d.sum(), expected);
        }
    }
}

#[test]
fn tensors_decode_back_to_raw_events() {
    let corpus = Corpus::construct(folk_tunes(), true).unwrap();
    let tensors = corpus.training_tensors().unwrap();
    let max_length = corpus.max_length().unwrap();

    for (i, melody) in corpus.melodies().iter().enumerate() {
        let start = max_length - melody.length();
        let decoded: Vec<i32> = (start..max_length)
            .map(|t| {
                let index = (0..corpus.pitch_vocabulary_size())
                    .find(|&v| tensors.pitches[[i, t, v]] == 1.0)
                    .unwrap();
                corpus.pitch_vocabulary().value_at(index).unwrap()
            })
            .collect();
        assert_eq!(decoded, melody.pitches());
    }
}

#[test]
fn own_vocabulary_encodes_foreign_vocabulary_does_not() {
    let corpus = Corpus::construct(folk_tunes(), false).unwrap();
    let subset = corpus.filter(&MinLength(5)).unwrap();

    let short = corpus.lookup("sessiontune4").unwrap();
    assert!(short
        .encode_integers(corpus.pitch_vocabulary(), corpus.duration_vocabulary())
        .is_ok());
    // pitch 72 only occurs in the dropped one-note tune
    assert!(matches!(
        short.encode_integers(subset.pitch_vocabulary(), subset.duration_vocabulary()),
        Err(CorpusError::OutOfVocabulary { .. })
    ));
}

#[test]
fn filtering_keeps_vocabulary_of_survivor() {
    let doc: RawDocument = [
        ("a", events(&[60, 62, 64], &[4, 4, 8])),
        ("b", events(&[60], &[4])),
    ]
    .into_iter()
    .collect();
    let corpus = Corpus::construct(doc, true).unwrap();

    let filtered = corpus.filter(&|m: &RawMelody| m.length() > 1).unwrap();
    assert!(filtered.lookup("b").is_none());
    assert_eq!(
        filtered.mappings().pitches,
        BTreeMap::from([(0, 60), (1, 62), (2, 64)])
    );
    assert_eq!(filtered.max_length().unwrap(), 3);
}

struct FixedKey(KeyDetection);

impl KeyAnalyzer for FixedKey {
    fn detect_key(&self, _melody: &RawMelody) -> Option<KeyDetection> {
        Some(self.0.clone())
    }
}

struct OnlyNamed(&'static str);

impl KeyAnalyzer for OnlyNamed {
    fn detect_key(&self, melody: &RawMelody) -> Option<KeyDetection> {
        (melody.name() == self.0).then_some(KeyDetection {
            tonic_pitch_class: 2,
            mode: KeyMode::Major,
            confidence: 1.0,
        })
    }
}

#[test]
fn transposition_uses_analyzer_offset() {
    let corpus = Corpus::construct(folk_tunes(), false).unwrap();
    let d_major = FixedKey(KeyDetection {
        tonic_pitch_class: 2,
        mode: KeyMode::Major,
        confidence: 1.0,
    });

    let moved = corpus.transpose_to_reference_key(&d_major).unwrap();
    assert_eq!(moved.lookup("sessiontune2").unwrap().pitches(), &[60, 62, 64, 65]);
    assert_eq!(
        moved.lookup("sessiontune2").unwrap().durations(),
        corpus.lookup("sessiontune2").unwrap().durations()
    );
    assert_eq!(moved.raw_form(), corpus.map(&Transpose(-2)).unwrap().raw_form());
}

#[test]
fn unanalyzable_melodies_are_dropped() {
    let corpus = Corpus::construct(folk_tunes(), true).unwrap();
    let moved = corpus
        .transpose_to_reference_key(&OnlyNamed("sessiontune2"))
        .unwrap();
    assert_eq!(moved.names().collect::<Vec<_>>(), vec!["sessiontune2"]);
    assert_eq!(moved.max_length().unwrap(), 4);
    assert!(moved.has_encodings());
}

#[test]
fn profile_analyzer_moves_g_major_tune_to_c() {
    let corpus = Corpus::construct(folk_tunes(), false).unwrap();
    let tune = corpus.lookup("sessiontune1").unwrap();
    let key = ProfileKeyAnalyzer.detect_key(tune).unwrap();
    assert_eq!(key.tonic_name(), "G");
    assert_eq!(key.mode, KeyMode::Major);

    let moved = corpus.transpose_to_reference_key(&ProfileKeyAnalyzer).unwrap();
    assert_eq!(moved.lookup("sessiontune1").unwrap().pitches()[0], 60);
}
