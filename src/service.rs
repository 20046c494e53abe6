// ABOUTME: Lyrics service owning the live index and its readiness state
// ABOUTME: Reloads build a fresh index off to the side, then swap it in

use crate::config::MatchConfig;
use crate::corpus;
use crate::embeddings::Embedder;
use crate::index::{IndexStats, LineIndex};
use crate::matcher::Matcher;
use crate::model::{MatchResult, PracticeStart, Song, SongSummary};
use crate::{Error, Result};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Entry point for request handlers. Starts not ready; matching requests
/// fail with [`Error::NotReady`] until a corpus has been indexed.
pub struct LyricsService {
    embedder: Arc<dyn Embedder>,
    config: MatchConfig,
    live: RwLock<Option<Arc<Matcher>>>,
}

impl std::fmt::Debug for LyricsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsService")
            .field("model_id", &self.embedder.model_id())
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl LyricsService {
    pub fn new(embedder: Arc<dyn Embedder>, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(LyricsService {
            embedder,
            config,
            live: RwLock::new(None),
        })
    }

    /// Load and index the corpus at `path`. On failure the previously live
    /// index, if any, keeps serving.
    pub fn load_corpus(&self, path: &Path) -> Result<IndexStats> {
        let songs = corpus::load_corpus(path).map_err(|e| {
            tracing::warn!(error = %e, "Corpus load failed");
            e
        })?;
        self.install(songs)
    }

    /// Index the per-user corpus, falling back to the bundled songs.
    pub fn load_default_corpus(&self, path: &Path) -> Result<IndexStats> {
        let songs = corpus::load_default_corpus(path).map_err(|e| {
            tracing::warn!(error = %e, "Corpus load failed");
            e
        })?;
        self.install(songs)
    }

    pub fn install(&self, songs: Vec<Song>) -> Result<IndexStats> {
        let index = Arc::new(LineIndex::build(songs, self.embedder.as_ref())?);
        let stats = index.stats();
        let matcher = Matcher::new(index, Arc::clone(&self.embedder), self.config.clone())?;

        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = live.replace(Arc::new(matcher)).is_some();
        drop(live);

        tracing::info!(
            songs = stats.songs,
            lines = stats.lines,
            replaced,
            "Lyric index ready"
        );
        Ok(stats)
    }

    pub fn is_ready(&self) -> bool {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Snapshot of the live matcher; in-flight queries keep theirs across a reload.
    pub fn matcher(&self) -> Result<Arc<Matcher>> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotReady)
    }

    pub fn index_status(&self) -> Option<IndexStats> {
        self.matcher().ok().map(|m| m.index().stats())
    }

    pub fn list_songs(&self) -> Result<Vec<SongSummary>> {
        let matcher = self.matcher()?;
        Ok(matcher.index().songs().iter().map(Song::summary).collect())
    }

    pub fn get_next_line(&self, sung_text: &str, song_id: Option<&str>) -> Result<MatchResult> {
        self.matcher()?.find_next(sung_text, song_id)
    }

    pub fn start_practice(&self, song_id: &str) -> Result<PracticeStart> {
        let matcher = self.matcher()?;
        let song = matcher
            .index()
            .song(song_id)
            .ok_or_else(|| Error::UnknownSong(song_id.to_string()))?;

        tracing::debug!(song_id, "Practice started");
        Ok(PracticeStart {
            song_id: song.id.clone(),
            title: song.title.clone(),
            artist: song.artist.clone(),
            first_line: song.lines.first().cloned(),
            total_lines: song.lines.len(),
        })
    }
}
