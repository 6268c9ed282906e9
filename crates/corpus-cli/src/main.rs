//! corpus - prepare melody corpora for sequence models
//!
//! Subcommands:
//! - `corpus inspect <file>` - Print corpus statistics
//! - `corpus prepare <file> -o <out>` - Filter, transpose and save a corpus
//! - `corpus sample <file> -n <count>` - Draw melody names with a seed
//! - `corpus vocab <file>` - Print the pitch and duration vocabularies

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpusconf::CorpusConfig;

mod commands;
mod telemetry;

#[derive(Parser, Debug)]
#[command(name = "corpus")]
#[command(about = "Prepare melody corpora for sequence models")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./melody-corpus.toml)
    #[arg(long, global = true, env = "MELODY_CORPUS_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print statistics for a corpus file
    Inspect {
        /// Corpus JSON document
        file: PathBuf,
    },

    /// Filter and optionally transpose a corpus, then save it
    Prepare {
        /// Corpus JSON document
        file: PathBuf,

        /// Output path for the prepared corpus
        #[arg(short, long)]
        output: PathBuf,

        /// Drop melodies with fewer events
        #[arg(long)]
        min_length: Option<usize>,

        /// Drop melodies with more events
        #[arg(long)]
        max_length: Option<usize>,

        /// Drop a melody by name (repeatable)
        #[arg(long = "exclude", value_name = "NAME")]
        exclude: Vec<String>,

        /// Keep only melodies whose durations are all in this list
        #[arg(long, value_delimiter = ',', value_name = "D,...")]
        allowed_durations: Option<Vec<i32>>,

        /// Transpose every melody to C major / A minor
        #[arg(long)]
        transpose: bool,

        /// Also write the vocabularies of the prepared corpus as JSON
        #[arg(long, value_name = "PATH")]
        vocab: Option<PathBuf>,
    },

    /// Print the names of melodies drawn with replacement
    Sample {
        /// Corpus JSON document
        file: PathBuf,

        /// Number of draws
        #[arg(short = 'n', long)]
        count: usize,

        /// RNG seed; a random one is logged when absent
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the pitch and duration vocabularies as JSON
    Vocab {
        /// Corpus JSON document
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CorpusConfig::load_from(cli.config.as_deref()).context("Failed to load config")?;
    telemetry::init(&config.logging.level, cli.verbose);

    match cli.command {
        Commands::Inspect { file } => commands::inspect(&config, &file),
        Commands::Prepare {
            file,
            output,
            min_length,
            max_length,
            exclude,
            allowed_durations,
            transpose,
            vocab,
        } => commands::prepare(
            &config,
            &commands::PrepareArgs {
                file,
                output,
                min_length,
                max_length,
                exclude,
                allowed_durations,
                transpose,
                vocab,
            },
        ),
        Commands::Sample { file, count, seed } => commands::sample(&config, &file, count, seed),
        Commands::Vocab { file } => commands::vocab(&config, &file),
    }
}
