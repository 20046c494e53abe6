// ABOUTME: TOML configuration for corpus location, embedder choice, and match policy
// ABOUTME: Every section falls back to defaults; thresholds are validated on load

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Song catalog; defaults to `songs.json` in the data directory.
    pub corpus_path: Option<PathBuf>,
    pub embedder: EmbedderConfig,
    pub matching: MatchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 through ONNX Runtime
    Onnx,
    /// Deterministic feature hashing, no model files
    Hash,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "embeddings") {
            EmbedderKind::Onnx
        } else {
            EmbedderKind::Hash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    /// Vector width of the hash embedder.
    pub hash_dim: usize,
    pub models_dir: Option<PathBuf>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::default(),
            hash_dim: 384,
            models_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Raw dot product; matches cosine for unit-length embeddings.
    #[default]
    Dot,
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Search every indexed line; the song scope only drives the verdict.
    #[default]
    Global,
    /// Restrict candidates to the requested song's lines.
    Scoped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Scores below this are reported as no match.
    pub discovery_threshold: f32,
    /// Scores must exceed this, in the requested song, to count as correct.
    pub correctness_threshold: f32,
    pub next_line_count: usize,
    pub metric: Metric,
    pub mode: SearchMode,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            discovery_threshold: 0.5,
            correctness_threshold: 0.6,
            next_line_count: 2,
            metric: Metric::Dot,
            mode: SearchMode::Global,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("discovery_threshold", self.discovery_threshold),
            ("correctness_threshold", self.correctness_threshold),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [-1, 1], got {}",
                    name, value
                )));
            }
        }

        if self.correctness_threshold <= self.discovery_threshold {
            return Err(Error::Config(format!(
                "correctness_threshold ({}) must be greater than discovery_threshold ({})",
                self.correctness_threshold, self.discovery_threshold
            )));
        }

        if self.next_line_count == 0 {
            return Err(Error::Config("next_line_count must be at least 1".into()));
        }

        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedder.hash_dim == 0 {
            return Err(Error::Config("embedder.hash_dim must be positive".into()));
        }
        self.matching.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_thresholds() {
        let config = MatchConfig::default();
        assert_eq!(config.discovery_threshold, 0.5);
        assert_eq!(config.correctness_threshold, 0.6);
        assert_eq!(config.next_line_count, 2);
        assert_eq!(config.metric, Metric::Dot);
        assert_eq!(config.mode, SearchMode::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_correctness_must_exceed_discovery() {
        let config = MatchConfig {
            discovery_threshold: 0.6,
            correctness_threshold: 0.6,
            ..MatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_threshold_range() {
        let config = MatchConfig {
            correctness_threshold: 1.5,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatchConfig {
            discovery_threshold: f32::NAN,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
corpus_path = "/srv/songs.json"

[embedder]
kind = "hash"

[matching]
discovery_threshold = 0.4
mode = "scoped"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.corpus_path, Some(PathBuf::from("/srv/songs.json")));
        assert_eq!(config.embedder.kind, EmbedderKind::Hash);
        assert_eq!(config.embedder.hash_dim, 384);
        assert_eq!(config.matching.discovery_threshold, 0.4);
        assert_eq!(config.matching.correctness_threshold, 0.6);
        assert_eq!(config.matching.mode, SearchMode::Scoped);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[matching]\nnext_line_count = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp.path().join("nope.toml")).unwrap();
        assert!(config.corpus_path.is_none());
        assert_eq!(config.matching, MatchConfig::default());
    }
}
