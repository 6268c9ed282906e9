//! Key detection and reference-key transposition offsets.
//!
//! [`KeyAnalyzer`] is the seam for whatever decides a melody's key; the corpus
//! only applies the resulting integer offset to pitches. [`ProfileKeyAnalyzer`]
//! is the built-in Krumhansl-Schmuckler implementation.

use serde::{Deserialize, Serialize};

use crate::melody::RawMelody;

/// Krumhansl-Kessler major key profile.
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

const NOTE_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

/// Pitch class of the reference tonic for major keys (C).
const MAJOR_REFERENCE: u8 = 0;
/// Pitch class of the reference tonic for minor keys (A).
const MINOR_REFERENCE: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDetection {
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub tonic_pitch_class: u8,
    pub mode: KeyMode,
    /// Pearson correlation with the best-matching profile
    pub confidence: f64,
}

impl KeyDetection {
    pub fn tonic_name(&self) -> &'static str {
        NOTE_NAMES[(self.tonic_pitch_class % 12) as usize]
    }
}

impl std::fmt::Display for KeyDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tonic_name(), self.mode)
    }
}

/// Anything that can name the key of a melody.
///
/// `None` means the melody could not be analyzed; callers drop it.
pub trait KeyAnalyzer: Send + Sync {
    fn detect_key(&self, melody: &RawMelody) -> Option<KeyDetection>;
}

/// Duration-weighted pitch-class profile correlation over all 24 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileKeyAnalyzer;

impl KeyAnalyzer for ProfileKeyAnalyzer {
    fn detect_key(&self, melody: &RawMelody) -> Option<KeyDetection> {
        let mut histogram = [0.0_f64; 12];
        for (&pitch, &duration) in melody.pitches().iter().zip(melody.durations()) {
            let pc = pitch.rem_euclid(12) as usize;
            histogram[pc] += duration.max(1) as f64;
        }

        let total: f64 = histogram.iter().sum();
        if total == 0.0 {
            return None;
        }
        for h in &mut histogram {
            *h /= total;
        }

        let mut best = KeyDetection {
            tonic_pitch_class: 0,
            mode: KeyMode::Major,
            confidence: -1.0,
        };

        for tonic in 0..12u8 {
            let mut rotated = [0.0; 12];
            for (i, slot) in rotated.iter_mut().enumerate() {
                *slot = histogram[(i + tonic as usize) % 12];
            }

            for (mode, profile) in [(KeyMode::Major, &MAJOR_PROFILE), (KeyMode::Minor, &MINOR_PROFILE)] {
                let corr = pearson(&rotated, profile);
                if corr > best.confidence {
                    best = KeyDetection {
                        tonic_pitch_class: tonic,
                        mode,
                        confidence: corr,
                    };
                }
            }
        }

        best.confidence = (best.confidence * 10000.0).round() / 10000.0;
        Some(best)
    }
}

fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}

/// Semitones that move `key` onto C major or A minor.
///
/// Both tonics are taken in the same octave, so the result lies in -11..=11
/// (G major → -7, C minor → +9).
pub fn reference_offset(key: &KeyDetection) -> i32 {
    let target = match key.mode {
        KeyMode::Major => MAJOR_REFERENCE,
        KeyMode::Minor => MINOR_REFERENCE,
    };
    target as i32 - (key.tonic_pitch_class % 12) as i32
}
