// ABOUTME: XDG-compliant locations for config, models, and the default corpus
// ABOUTME: Resolves per-user directories with an optional data dir override

use crate::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Paths {
    pub fn new(data_dir_override: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = data_dir_override {
            return Ok(Paths {
                config_dir: dir.clone(),
                models_dir: dir.join("models"),
                data_dir: dir,
            });
        }

        let dirs = ProjectDirs::from("", "", "singalong").ok_or_else(|| {
            Error::Filesystem(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        let data_dir = dirs.data_dir().to_path_buf();
        Ok(Paths {
            config_dir: dirs.config_dir().to_path_buf(),
            models_dir: data_dir.join("models"),
            data_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn default_corpus(&self) -> PathBuf {
        self.data_dir.join("songs.json")
    }
}
