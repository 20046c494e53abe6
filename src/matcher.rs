// ABOUTME: Similarity search over the line index plus the confidence/verdict policy
// ABOUTME: Two thresholds separate "heard nothing" from "heard the wrong song"

use crate::config::{MatchConfig, SearchMode};
use crate::embeddings::vector::first_max;
use crate::embeddings::Embedder;
use crate::index::LineIndex;
use crate::model::{LineRecord, MatchResult};
use crate::{Error, Result};
use ndarray::Array1;
use std::sync::Arc;

/// Query side of a built index. Cheap to clone; never mutates the index.
#[derive(Clone)]
pub struct Matcher {
    index: Arc<LineIndex>,
    embedder: Arc<dyn Embedder>,
    config: MatchConfig,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("lines", &self.index.len())
            .field("model_id", &self.index.model_id())
            .field("config", &self.config)
            .finish()
    }
}

impl Matcher {
    pub fn new(
        index: Arc<LineIndex>,
        embedder: Arc<dyn Embedder>,
        config: MatchConfig,
    ) -> Result<Self> {
        config.validate()?;
        if index.model_id() != embedder.model_id() {
            return Err(Error::ModelMismatch {
                index: index.model_id().to_string(),
                query: embedder.model_id().to_string(),
            });
        }
        Ok(Matcher {
            index,
            embedder,
            config,
        })
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn scores(&self, query: &str) -> Result<Array1<f32>> {
        let vector = self.embedder.embed(query)?;
        self.index.matrix().scores(&vector, self.config.metric)
    }

    /// Best line across the whole corpus, or `None` below the discovery threshold.
    pub fn find_best(&self, query: &str) -> Result<Option<(&LineRecord, f32)>> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        let scores = self.scores(query)?;
        Ok(first_max(&scores, 0..self.index.len())
            .filter(|&(_, score)| score >= self.config.discovery_threshold)
            .and_then(|(row, score)| self.index.record(row).map(|r| (r, score))))
    }

    /// Lines following `row` in its own song.
    pub fn next_lines(&self, row: usize) -> Vec<String> {
        self.index.successors(row, self.config.next_line_count)
    }

    /// Identify the sung line and judge it against the song being practiced.
    pub fn find_next(&self, query: &str, song_id: Option<&str>) -> Result<MatchResult> {
        // A song missing from the corpus has no rows: in global mode the
        // search still runs and the verdict is simply incorrect.
        let scope = match song_id {
            Some(id) => match (self.index.song_rows(id), self.config.mode) {
                (Some(rows), _) => Some(rows),
                (None, SearchMode::Global) => Some(0..0),
                (None, SearchMode::Scoped) => return Err(Error::UnknownSong(id.to_string())),
            },
            None => None,
        };

        if query.trim().is_empty() {
            return Ok(MatchResult::not_found());
        }

        let scores = self.scores(query)?;
        let candidates = match (&scope, self.config.mode) {
            (Some(rows), SearchMode::Scoped) => rows.clone(),
            _ => 0..self.index.len(),
        };

        let Some((row, score)) = first_max(&scores, candidates) else {
            return Ok(MatchResult::not_found());
        };

        if score < self.config.discovery_threshold {
            tracing::info!(score, query, "Low confidence match");
            return Ok(MatchResult::not_found());
        }

        let Some(record) = self.index.record(row) else {
            return Ok(MatchResult::not_found());
        };
        let song = self.index.song_of(record);

        // When the winner lies outside the requested song, the verdict is
        // judged on how well the query fits that song.
        let confidence = match &scope {
            Some(rows) if !rows.contains(&row) => first_max(&scores, rows.clone())
                .map(|(_, s)| s)
                .unwrap_or(0.0),
            _ => score,
        };

        let is_correct = song_id == Some(record.song_id.as_str())
            && confidence > self.config.correctness_threshold;

        tracing::debug!(
            song_id = %record.song_id,
            line = record.line_number,
            score,
            confidence,
            is_correct,
            "Global match"
        );

        Ok(MatchResult {
            found: true,
            song_id: Some(record.song_id.clone()),
            title: Some(song.title.clone()),
            artist: Some(song.artist.clone()),
            matched_line: Some(record.text.clone()),
            matched_line_number: Some(record.line_number),
            next_lines: self.next_lines(row),
            confidence,
            match_score: score,
            is_correct,
        })
    }
}
