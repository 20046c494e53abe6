// ABOUTME: Public library API for the singalong lyric retrieval engine
// ABOUTME: Re-exports core modules for external use

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod paths;
pub mod service;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use config::{Config, MatchConfig};
pub use embeddings::Embedder;
pub use error::{Error, Result};
pub use index::{IndexStats, LineIndex};
pub use matcher::Matcher;
pub use model::{LineRecord, MatchResult, NextLine, PracticeStart, Song, SongSummary};
pub use service::LyricsService;
