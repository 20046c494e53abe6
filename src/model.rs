// ABOUTME: Serde data models for songs, indexed lyric lines, and match results
// ABOUTME: Tolerant corpus parsing with optional metadata fields

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sentinel emitted in place of a successor line for the last line of a song.
pub const END_OF_SONG: &str = "END_OF_SONG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default = "unknown_artist")]
    pub artist: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(alias = "lyrics")]
    pub lines: Vec<String>,
}

fn unknown_artist() -> String {
    "Unknown".to_string()
}

impl Song {
    pub fn summary(&self) -> SongSummary {
        SongSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            language: self.language.clone(),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// Song metadata without the lyric payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub language: String,
    pub difficulty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_deserialize_lyrics_alias() {
        let json = r#"{
            "id": "twinkle_star",
            "title": "Twinkle Twinkle Little Star",
            "artist": "Traditional",
            "language": "English",
            "difficulty": "Easy",
            "lyrics": ["Twinkle twinkle little star", "How I wonder what you are"]
        }"#;
        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.id, "twinkle_star");
        assert_eq!(song.lines.len(), 2);
    }

    #[test]
    fn test_song_deserialize_minimal() {
        let json = r#"{"id": "s1", "title": "Song", "lines": ["a"]}"#;
        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.artist, "Unknown");
        assert!(song.language.is_empty());
        assert!(song.difficulty.is_empty());
    }

    #[test]
    fn test_song_summary_drops_lines() {
        let song = Song {
            id: "s1".into(),
            title: "Song".into(),
            artist: "Someone".into(),
            language: "English".into(),
            difficulty: "Easy".into(),
            lines: vec!["a".into(), "b".into()],
        };
        let value = serde_json::to_value(song.summary()).unwrap();
        assert_eq!(value["id"], "s1");
        assert!(value.get("lines").is_none());
    }
}

/// Successor of an indexed line within its own song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLine {
    Line(String),
    EndOfSong,
}

impl NextLine {
    pub fn as_str(&self) -> &str {
        match self {
            NextLine::Line(text) => text,
            NextLine::EndOfSong => END_OF_SONG,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, NextLine::EndOfSong)
    }
}

impl fmt::Display for NextLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NextLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One lyric line in the flattened index. The embedding lives in the
/// index matrix at the same row as this record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRecord {
    pub song_id: String,
    pub line_number: usize,
    pub text: String,
    pub next_line: NextLine,
    #[serde(skip)]
    pub(crate) song_index: usize,
}


/// Answer to a single sung query. Constructed per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub found: bool,
    #[serde(default)]
    pub song_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub matched_line: Option<String>,
    #[serde(default)]
    pub matched_line_number: Option<usize>,
    #[serde(default)]
    pub next_lines: Vec<String>,
    /// Similarity backing the verdict. Within the requested song when a
    /// scope is given, otherwise the global best score.
    pub confidence: f32,
    /// Similarity of the global best line.
    #[serde(default)]
    pub match_score: f32,
    pub is_correct: bool,
}

impl MatchResult {
    pub fn not_found() -> Self {
        MatchResult {
            found: false,
            song_id: None,
            title: None,
            artist: None,
            matched_line: None,
            matched_line_number: None,
            next_lines: Vec::new(),
            confidence: 0.0,
            match_score: 0.0,
            is_correct: false,
        }
    }

    /// First expected continuation, if any.
    pub fn next_line(&self) -> Option<&str> {
        self.next_lines.first().map(String::as_str)
    }
}

/// Opening of a practice session for one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeStart {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub first_line: Option<String>,
    pub total_lines: usize,
}
