// ABOUTME: Embedder abstraction mapping lyric text to dense vectors
// ABOUTME: ONNX MiniLM engine behind the embeddings feature, hash embedder always available

#[cfg(feature = "embeddings")]
pub mod engine;

#[cfg(feature = "embeddings")]
pub mod downloader;

pub mod hashing;
pub mod vector;

#[cfg(feature = "embeddings")]
pub use downloader::{ensure_model, ModelPaths, ModelSource};

#[cfg(feature = "embeddings")]
pub use engine::OnnxEmbedder;

pub use hashing::HashEmbedder;
pub use vector::EmbeddingMatrix;

use crate::config::{EmbedderConfig, EmbedderKind};
use crate::{paths::Paths, Result};
use std::sync::Arc;

/// Text to vector function. Must stay the same model for the lifetime of
/// an index: vectors from different models are not comparable.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch form used once at index build time.
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dim(&self) -> usize;

    /// Stable identity of the model and its version.
    fn model_id(&self) -> &str;
}

/// Construct the configured embedder, downloading model files if needed.
pub fn build_embedder(config: &EmbedderConfig, paths: &Paths) -> Result<Arc<dyn Embedder>> {
    match config.kind {
        EmbedderKind::Hash => Ok(Arc::new(HashEmbedder::new(config.hash_dim))),
        #[cfg(feature = "embeddings")]
        EmbedderKind::Onnx => {
            let models_dir = config
                .models_dir
                .clone()
                .unwrap_or_else(|| paths.models_dir.clone());
            Ok(Arc::new(OnnxEmbedder::from_dir(&models_dir)?))
        }
        #[cfg(not(feature = "embeddings"))]
        EmbedderKind::Onnx => {
            let _ = paths;
            Err(crate::Error::Config(
                "ONNX embedder requires the `embeddings` feature".into(),
            ))
        }
    }
}
