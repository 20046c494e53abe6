// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use crate::config::{Config, EmbedderKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "singalong")]
#[command(about = "Identify a sung lyric line and get the next lines of the song", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: <config dir>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Song corpus JSON (overrides config; defaults to songs.json in the data dir, else the bundled songs)
    #[arg(long, global = true)]
    pub corpus: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Embedding backend (overrides config)
    #[arg(long, global = true, value_enum)]
    pub embedder: Option<EmbedderArg>,

    /// Minimum score to report any match (overrides config)
    #[arg(long, global = true)]
    pub discovery_threshold: Option<f32>,

    /// Minimum score for a correct verdict (overrides config)
    #[arg(long, global = true)]
    pub correctness_threshold: Option<f32>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderArg {
    Onnx,
    Hash,
}

impl From<EmbedderArg> for EmbedderKind {
    fn from(arg: EmbedderArg) -> Self {
        match arg {
            EmbedderArg::Onnx => EmbedderKind::Onnx,
            EmbedderArg::Hash => EmbedderKind::Hash,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List available songs (default)
    Songs,

    /// Match a sung line and print the next lines
    Match {
        /// What was sung
        text: String,

        /// Song being practiced
        #[arg(long)]
        song: Option<String>,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Show the first line of a song to start practicing
    Practice {
        /// Song ID
        song: String,
    },

    /// Build the index and print its statistics
    Index,

    /// Download the ONNX embedding model
    Model,

    /// Serve the MCP stdio interface
    Serve,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Songs)
    }

    /// Flags win over file values.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(corpus) = &self.corpus {
            config.corpus_path = Some(corpus.clone());
        }
        if let Some(kind) = self.embedder {
            config.embedder.kind = kind.into();
        }
        if let Some(value) = self.discovery_threshold {
            config.matching.discovery_threshold = value;
        }
        if let Some(value) = self.correctness_threshold {
            config.matching.correctness_threshold = value;
        }
    }
}
