// ABOUTME: Automatic model downloader for the all-MiniLM-L6-v2 ONNX export
// ABOUTME: Downloads from HuggingFace and caches in the XDG data directory

use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(models_dir: &Path) -> Self {
        ModelPaths {
            model_path: models_dir.join("all-MiniLM-L6-v2.onnx"),
            tokenizer_path: models_dir.join("all-MiniLM-L6-v2-tokenizer.json"),
        }
    }

    pub fn exists(&self) -> bool {
        self.model_path.exists() && self.tokenizer_path.exists()
    }
}

/// Where model files are fetched from.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub model_url: String,
    pub tokenizer_url: String,
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource {
            model_url: MODEL_URL.to_string(),
            tokenizer_url: TOKENIZER_URL.to_string(),
        }
    }
}

pub fn ensure_model(models_dir: &Path) -> Result<ModelPaths> {
    ensure_model_from(models_dir, &ModelSource::default())
}

pub fn ensure_model_from(models_dir: &Path, source: &ModelSource) -> Result<ModelPaths> {
    let paths = ModelPaths::in_dir(models_dir);
    if paths.exists() {
        return Ok(paths);
    }

    fs::create_dir_all(models_dir)?;
    tracing::info!(dir = %models_dir.display(), "Downloading all-MiniLM-L6-v2 embedding model (first time only)");

    if !paths.model_path.exists() {
        download_file(&source.model_url, &paths.model_path, "model.onnx")?;
    }

    if !paths.tokenizer_path.exists() {
        download_file(&source.tokenizer_url, &paths.tokenizer_path, "tokenizer.json")?;
    }

    tracing::info!("Model downloaded successfully");
    Ok(paths)
}

fn download_file(url: &str, dest: &Path, display_name: &str) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(Error::Embedding(format!(
            "Failed to download {}: HTTP {}",
            display_name,
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);

    let pb = if total_size > 0 {
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map_err(|e| Error::Embedding(format!("Invalid progress template: {}", e)))?
            .progress_chars("#>-");
        let pb = ProgressBar::new(total_size);
        pb.set_style(style);
        pb.set_message(format!("Downloading {}", display_name));
        Some(pb)
    } else {
        tracing::info!(file = display_name, "Downloading (size unknown)");
        None
    };

    let bytes = response.bytes()?;

    // Write next to the destination, then rename, so a partial download
    // never looks like a complete model.
    let part_path = dest.with_extension("part");
    let mut file = fs::File::create(&part_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&part_path, dest)?;

    if let Some(pb) = pb {
        pb.set_position(bytes.len() as u64);
        pb.finish_with_message(format!("Downloaded {}", display_name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_paths_layout() {
        let temp = TempDir::new().unwrap();
        let paths = ModelPaths::in_dir(temp.path());

        assert!(paths.model_path.to_string_lossy().ends_with(".onnx"));
        assert!(paths
            .tokenizer_path
            .to_string_lossy()
            .ends_with("tokenizer.json"));
        assert!(!paths.exists());
    }

    #[test]
    fn test_existing_files_skip_download() {
        let temp = TempDir::new().unwrap();
        let paths = ModelPaths::in_dir(temp.path());
        fs::write(&paths.model_path, b"onnx").unwrap();
        fs::write(&paths.tokenizer_path, b"{}").unwrap();

        // An unreachable source proves nothing is fetched
        let source = ModelSource {
            model_url: "http://127.0.0.1:1/model.onnx".into(),
            tokenizer_url: "http://127.0.0.1:1/tokenizer.json".into(),
        };
        let resolved = ensure_model_from(temp.path(), &source).unwrap();
        assert_eq!(resolved.model_path, paths.model_path);
    }

    #[test]
    fn test_model_urls_format() {
        assert!(MODEL_URL.starts_with("https://"));
        assert!(MODEL_URL.contains("huggingface.co"));
        assert!(TOKENIZER_URL.ends_with("tokenizer.json"));
    }
}
