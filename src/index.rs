// ABOUTME: Flattened lyric line index built once from the song corpus
// ABOUTME: Rows follow song order then line order; the matrix shares that order

use crate::corpus::validate_corpus;
use crate::embeddings::{Embedder, EmbeddingMatrix};
use crate::model::{LineRecord, NextLine, Song};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ndarray::ArrayView1;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub songs: usize,
    pub lines: usize,
    pub dim: usize,
    pub model_id: String,
    pub built_at: DateTime<Utc>,
}

/// Read-only after [`LineIndex::build`]. Reloading means building a new one.
#[derive(Debug)]
pub struct LineIndex {
    songs: Vec<Song>,
    records: Vec<LineRecord>,
    /// Row range of each song, by position in `songs`.
    song_rows: Vec<Range<usize>>,
    song_lookup: HashMap<String, usize>,
    matrix: EmbeddingMatrix,
    model_id: String,
    built_at: DateTime<Utc>,
}

impl LineIndex {
    pub fn build(songs: Vec<Song>, embedder: &dyn Embedder) -> Result<Self> {
        validate_corpus(&songs)?;
        let started = Instant::now();

        let mut records = Vec::new();
        let mut song_rows = Vec::with_capacity(songs.len());
        let mut song_lookup = HashMap::with_capacity(songs.len());

        for (song_index, song) in songs.iter().enumerate() {
            let start = records.len();
            for (line_number, text) in song.lines.iter().enumerate() {
                let next_line = match song.lines.get(line_number + 1) {
                    Some(next) => NextLine::Line(next.clone()),
                    None => NextLine::EndOfSong,
                };
                records.push(LineRecord {
                    song_id: song.id.clone(),
                    line_number,
                    text: text.clone(),
                    next_line,
                    song_index,
                });
            }
            song_rows.push(start..records.len());
            song_lookup.insert(song.id.clone(), song_index);
        }

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let vectors = embedder.embed_many(&texts)?;
        if vectors.len() != records.len() {
            return Err(Error::Embedding(format!(
                "Embedder returned {} vectors for {} lines",
                vectors.len(),
                records.len()
            )));
        }
        let matrix = EmbeddingMatrix::from_rows(vectors, embedder.dim())?;

        tracing::info!(
            songs = songs.len(),
            lines = records.len(),
            dim = matrix.dim(),
            model = embedder.model_id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexed lyric lines"
        );

        Ok(LineIndex {
            songs,
            records,
            song_rows,
            song_lookup,
            matrix,
            model_id: embedder.model_id().to_string(),
            built_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    pub fn record(&self, row: usize) -> Option<&LineRecord> {
        self.records.get(row)
    }

    pub fn embedding(&self, row: usize) -> Option<ArrayView1<'_, f32>> {
        (row < self.matrix.len()).then(|| self.matrix.row(row))
    }

    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn song(&self, song_id: &str) -> Option<&Song> {
        self.song_lookup.get(song_id).map(|&i| &self.songs[i])
    }

    pub fn song_of(&self, record: &LineRecord) -> &Song {
        &self.songs[record.song_index]
    }

    /// Flattened rows holding the lines of `song_id`.
    pub fn song_rows(&self, song_id: &str) -> Option<Range<usize>> {
        self.song_lookup
            .get(song_id)
            .map(|&i| self.song_rows[i].clone())
    }

    /// Up to `count` lines following `row` within the same song, read from
    /// the song's own line sequence so a continuation never crosses into
    /// the next song.
    pub fn successors(&self, row: usize, count: usize) -> Vec<String> {
        let Some(record) = self.records.get(row) else {
            return Vec::new();
        };
        let lines = &self.songs[record.song_index].lines;
        lines
            .iter()
            .skip(record.line_number + 1)
            .take(count)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            songs: self.songs.len(),
            lines: self.records.len(),
            dim: self.matrix.dim(),
            model_id: self.model_id.clone(),
            built_at: self.built_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use crate::model::END_OF_SONG;

    fn song(id: &str, lines: &[&str]) -> Song {
        Song {
            id: id.into(),
            title: id.to_uppercase(),
            artist: "Traditional".into(),
            language: "English".into(),
            difficulty: "Easy".into(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn build(songs: Vec<Song>) -> LineIndex {
        LineIndex::build(songs, &HashEmbedder::new(64)).unwrap()
    }

    #[test]
    fn test_flattened_order_and_line_numbers() {
        let index = build(vec![song("a", &["a0", "a1", "a2"]), song("b", &["b0", "b1"])]);

        assert_eq!(index.len(), 5);
        let ids: Vec<_> = index
            .records()
            .iter()
            .map(|r| (r.song_id.as_str(), r.line_number))
            .collect();
        assert_eq!(
            ids,
            vec![("a", 0), ("a", 1), ("a", 2), ("b", 0), ("b", 1)]
        );
        assert_eq!(index.matrix().len(), index.len());
    }

    #[test]
    fn test_next_line_never_crosses_songs() {
        let index = build(vec![song("a", &["a0", "a1"]), song("b", &["b0"])]);
        let records = index.records();

        assert_eq!(records[0].next_line, NextLine::Line("a1".into()));
        assert_eq!(records[1].next_line.as_str(), END_OF_SONG);
        assert_eq!(records[2].next_line, NextLine::EndOfSong);
    }

    #[test]
    fn test_song_rows_and_lookup() {
        let index = build(vec![song("a", &["a0", "a1"]), song("empty", &[]), song("b", &["b0"])]);

        assert_eq!(index.song_rows("a"), Some(0..2));
        assert_eq!(index.song_rows("empty"), Some(2..2));
        assert_eq!(index.song_rows("b"), Some(2..3));
        assert_eq!(index.song_rows("zzz"), None);
        assert_eq!(index.song("b").map(|s| s.title.as_str()), Some("B"));
    }

    #[test]
    fn test_successors_bounded_by_song() {
        let index = build(vec![song("a", &["a0", "a1", "a2", "a3"]), song("b", &["b0", "b1"])]);

        assert_eq!(index.successors(0, 2), vec!["a1", "a2"]);
        assert_eq!(index.successors(2, 2), vec!["a3"]);
        assert!(index.successors(3, 2).is_empty());
        assert_eq!(index.successors(4, 5), vec!["b1"]);
        assert!(index.successors(99, 2).is_empty());
    }

    #[test]
    fn test_empty_corpus_fails_fast() {
        let err = LineIndex::build(vec![], &HashEmbedder::new(8)).unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));

        let err = LineIndex::build(vec![song("a", &[])], &HashEmbedder::new(8)).unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }

    #[test]
    fn test_embedding_failure_propagates() {
        struct Broken;
        impl Embedder for Broken {
            fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(Error::Embedding("backend unavailable".into()))
            }
            fn dim(&self) -> usize {
                4
            }
            fn model_id(&self) -> &str {
                "broken"
            }
        }

        let err = LineIndex::build(vec![song("a", &["x"])], &Broken).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_stats() {
        let index = build(vec![song("a", &["a0", "a1"])]);
        let stats = index.stats();
        assert_eq!(stats.songs, 1);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.dim, 64);
        assert_eq!(stats.model_id, "fnv1a-hash-v1-64");
        assert!(index.embedding(1).is_some());
        assert!(index.embedding(2).is_none());
    }
}
