// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Separates fatal corpus errors from per-query embedding failures

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Corpus load error: {0}")]
    CorpusLoad(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Lyric index is not ready")]
    NotReady,

    #[error("Embedding model mismatch: index built with {index}, query embedder is {query}")]
    ModelMismatch { index: String, query: String },

    #[error("Unknown song: {0}")]
    UnknownSong(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CorpusLoad(_) => 2,
            Error::Embedding(_) => 3,
            Error::NotReady => 4,
            Error::ModelMismatch { .. } => 5,
            Error::UnknownSong(_) => 6,
            Error::Config(_) => 7,
            Error::Network(_) => 8,
            Error::Parse(_) => 9,
            Error::Filesystem(_) => 10,
            Error::Server(_) => 11,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
