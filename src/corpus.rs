// ABOUTME: Song catalog loading from a static JSON source
// ABOUTME: Validates the corpus before it is allowed to reach the index builder

use crate::{Error, Result, Song};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub fn load_corpus(path: &Path) -> Result<Vec<Song>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::CorpusLoad(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let songs = parse_corpus(&content)?;
    tracing::info!(
        path = %path.display(),
        songs = songs.len(),
        "Loaded song corpus"
    );
    Ok(songs)
}

/// Five-song catalog compiled into the binary.
pub const BUNDLED_CORPUS: &str = include_str!("../data/songs.json");

pub fn bundled_corpus() -> Result<Vec<Song>> {
    parse_corpus(BUNDLED_CORPUS)
}

/// Load the per-user corpus at `path`, or the bundled catalog if none is installed.
pub fn load_default_corpus(path: &Path) -> Result<Vec<Song>> {
    if path.exists() {
        return load_corpus(path);
    }
    tracing::info!(
        path = %path.display(),
        "No corpus installed, using bundled songs"
    );
    bundled_corpus()
}

pub fn parse_corpus(json: &str) -> Result<Vec<Song>> {
    let songs: Vec<Song> = serde_json::from_str(json)
        .map_err(|e| Error::CorpusLoad(format!("Malformed corpus: {}", e)))?;
    validate_corpus(&songs)?;
    Ok(songs)
}

/// A corpus must hold at least one lyric line and unique, non-empty song ids.
pub fn validate_corpus(songs: &[Song]) -> Result<()> {
    if songs.is_empty() {
        return Err(Error::CorpusLoad("Corpus contains no songs".into()));
    }

    let mut seen = HashSet::new();
    for song in songs {
        if song.id.trim().is_empty() {
            return Err(Error::CorpusLoad(format!(
                "Song '{}' has an empty id",
                song.title
            )));
        }
        if !seen.insert(song.id.as_str()) {
            return Err(Error::CorpusLoad(format!("Duplicate song id: {}", song.id)));
        }
        if song.lines.is_empty() {
            tracing::warn!(song_id = %song.id, "Song has no lyric lines");
        }
    }

    if songs.iter().all(|s| s.lines.is_empty()) {
        return Err(Error::CorpusLoad("Corpus contains no lyric lines".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CORPUS: &str = r#"[
        {"id": "a", "title": "A", "artist": "X", "language": "English",
         "difficulty": "Easy", "lyrics": ["one", "two"]},
        {"id": "b", "title": "B", "artist": "Y", "language": "Spanish",
         "difficulty": "Hard", "lyrics": ["uno"]}
    ]"#;

    #[test]
    fn test_parse_corpus_preserves_order() {
        let songs = parse_corpus(CORPUS).unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(songs[0].lines, vec!["one", "two"]);
    }

    #[test]
    fn test_malformed_corpus_is_corpus_error() {
        let err = parse_corpus("{not json").unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        assert!(matches!(parse_corpus("[]"), Err(Error::CorpusLoad(_))));

        let no_lines = r#"[{"id": "a", "title": "A", "lines": []}]"#;
        assert!(matches!(parse_corpus(no_lines), Err(Error::CorpusLoad(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dup = r#"[
            {"id": "a", "title": "A", "lines": ["x"]},
            {"id": "a", "title": "A2", "lines": ["y"]}
        ]"#;
        let err = parse_corpus(dup).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_load_corpus_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_corpus(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }

    #[test]
    fn test_load_corpus_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("songs.json");
        fs::write(&path, CORPUS).unwrap();

        let songs = load_corpus(&path).unwrap();
        assert_eq!(songs.len(), 2);
    }

    #[test]
    fn test_bundled_corpus_parses() {
        let songs = bundled_corpus().unwrap();
        assert_eq!(songs.len(), 5);
        assert_eq!(songs[0].id, "twinkle_star");
        assert_eq!(songs[0].lines[0], "Twinkle twinkle little star");
    }

    #[test]
    fn test_default_corpus_falls_back_to_bundled() {
        let temp = TempDir::new().unwrap();
        let songs = load_default_corpus(&temp.path().join("songs.json")).unwrap();
        assert_eq!(songs.len(), 5);
    }

    #[test]
    fn test_installed_corpus_wins_over_bundled() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("songs.json");
        fs::write(&path, CORPUS).unwrap();

        let songs = load_default_corpus(&path).unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_broken_installed_corpus_is_not_masked() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("songs.json");
        fs::write(&path, "[]").unwrap();

        let err = load_default_corpus(&path).unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }
}
