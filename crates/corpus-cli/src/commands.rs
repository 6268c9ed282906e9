//! CLI command implementations

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use corpusconf::CorpusConfig;
use melody_corpus::{
    AllowedDurations, Corpus, ExcludeNames, MaxLength, MinLength, ProfileKeyAnalyzer,
};
use serde::Serialize;
use tracing::{debug, info};

/// Arguments of `corpus prepare` after clap parsing.
#[derive(Debug, Clone, Default)]
pub struct PrepareArgs {
    pub file: PathBuf,
    pub output: PathBuf,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub exclude: Vec<String>,
    pub allowed_durations: Option<Vec<i32>>,
    pub transpose: bool,
    pub vocab: Option<PathBuf>,
}

fn load_corpus(config: &CorpusConfig, file: &Path) -> Result<Corpus> {
    let path = config.paths.resolve(file);
    melody_corpus::load_lazy(&path)
        .with_context(|| format!("Failed to load corpus {}", path.display()))
}

/// Print statistics for a corpus file
pub fn inspect(config: &CorpusConfig, file: &Path) -> Result<()> {
    let corpus = load_corpus(config, file)?;
    println!("{}", corpus.stats());
    Ok(())
}

/// Apply the configured filters and transposition, returning the result.
pub fn prepare_corpus(config: &CorpusConfig, corpus: Corpus, args: &PrepareArgs) -> Result<Corpus> {
    let mut corpus = corpus;

    if let Some(min) = args.min_length.or(config.prepare.min_length) {
        corpus = corpus
            .filter(&MinLength(min))
            .context("Failed to apply minimum length")?;
        debug!(min, remaining = corpus.len(), "filtered by minimum length");
    }

    if let Some(max) = args.max_length.or(config.prepare.max_length) {
        corpus = corpus
            .filter(&MaxLength(max))
            .context("Failed to apply maximum length")?;
        debug!(max, remaining = corpus.len(), "filtered by maximum length");
    }

    if !args.exclude.is_empty() {
        corpus = corpus
            .filter(&ExcludeNames::new(args.exclude.iter().cloned()))
            .context("Failed to exclude melodies")?;
        debug!(excluded = args.exclude.len(), remaining = corpus.len(), "excluded by name");
    }

    if let Some(allowed) = &args.allowed_durations {
        let allowed: BTreeSet<i32> = allowed.iter().copied().collect();
        corpus = corpus
            .filter(&AllowedDurations(allowed))
            .context("Failed to filter by duration")?;
        debug!(remaining = corpus.len(), "filtered by allowed durations");
    }

    if args.transpose || config.prepare.transpose {
        corpus = corpus
            .transpose_to_reference_key(&ProfileKeyAnalyzer)
            .context("Failed to transpose corpus")?;
        debug!(remaining = corpus.len(), "transposed to reference keys");
    }

    Ok(corpus)
}

/// Load, filter, optionally transpose, and save a corpus
pub fn prepare(config: &CorpusConfig, args: &PrepareArgs) -> Result<()> {
    let corpus = load_corpus(config, &args.file)?;
    let before = corpus.len();

    let prepared = prepare_corpus(config, corpus, args)?;

    melody_corpus::save(&prepared, &args.output)
        .with_context(|| format!("Failed to save corpus {}", args.output.display()))?;

    if let Some(vocab_path) = &args.vocab {
        write_json(vocab_path, &prepared.mappings())
            .with_context(|| format!("Failed to write vocabularies {}", vocab_path.display()))?;
    }

    info!(before, after = prepared.len(), "prepared corpus");
    println!(
        "Kept {} of {} melodies -> {}",
        prepared.len(),
        before,
        args.output.display()
    );
    Ok(())
}

/// Print the names of `count` melodies drawn with replacement
pub fn sample(config: &CorpusConfig, file: &Path, count: usize, seed: Option<u64>) -> Result<()> {
    let corpus = load_corpus(config, file)?;

    let seed = seed
        .or(config.prepare.seed)
        .unwrap_or_else(rand::random::<u64>);
    info!(seed, count, "sampling corpus");

    for melody in corpus.sample(count, seed) {
        println!("{}", melody.name());
    }
    Ok(())
}

/// Print both vocabularies as index -> value JSON objects
pub fn vocab(config: &CorpusConfig, file: &Path) -> Result<()> {
    let corpus = load_corpus(config, file)?;
    let output = serde_json::to_string_pretty(&corpus.mappings())?;
    println!("{}", output);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
