// ABOUTME: ONNX embedding engine for the all-MiniLM-L6-v2 sentence model
// ABOUTME: Handles tokenization, inference, and mean pooling for line embeddings

use super::{downloader, Embedder};
use crate::{Error, Result};
use ort::{inputs, session::Session, value::Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

const MINILM_DIM: usize = 384;
const MAX_LENGTH: usize = 256;
const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Arc<Tokenizer>,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("model", &MODEL_ID)
            .finish()
    }
}

impl OnnxEmbedder {
    /// Load from `models_dir`, fetching the model on first use.
    pub fn from_dir(models_dir: &Path) -> Result<Self> {
        let paths = downloader::ensure_model(models_dir)?;
        Self::new(&paths.model_path, &paths.tokenizer_path)
    }

    pub fn new(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        // Initialize ort globally (idempotent)
        ort::init()
            .commit()
            .map_err(|e| Error::Embedding(format!("Failed to initialize ort: {}", e)))?;

        let tokenizer = Arc::new(Tokenizer::from_file(tokenizer_path).map_err(|e| {
            Error::Embedding(format!("Failed to load tokenizer: {}", e))
        })?);

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| Error::Embedding(format!("Failed to read model file: {}", e)))?;

        let session = Session::builder()
            .map_err(|e| Error::Embedding(format!("Failed to create session builder: {}", e)))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| Error::Embedding(format!("Failed to load ONNX model: {}", e)))?;

        tracing::info!(model = MODEL_ID, "Loaded ONNX embedding model");

        Ok(OnnxEmbedder {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn embed_with(&self, session: &mut Session, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(format!("Tokenization failed: {}", e)))?;

        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        let len = input_ids.len().min(MAX_LENGTH);
        let input_ids = &input_ids[..len];
        let attention_mask = &attention_mask[..len];

        // ONNX expects i64
        let input_ids_i64: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let attention_mask_i64: Vec<i64> =
            attention_mask.iter().map(|&mask| mask as i64).collect();
        let token_type_ids: Vec<i64> = vec![0; len];

        let input_ids_value = Value::from_array((vec![1, len], input_ids_i64))
            .map_err(|e| Error::Embedding(format!("Failed to create input_ids tensor: {}", e)))?;
        let attention_mask_value = Value::from_array((vec![1, len], attention_mask_i64))
            .map_err(|e| Error::Embedding(format!("Failed to create attention_mask tensor: {}", e)))?;
        let token_type_ids_value = Value::from_array((vec![1, len], token_type_ids))
            .map_err(|e| Error::Embedding(format!("Failed to create token_type_ids tensor: {}", e)))?;

        let outputs = session
            .run(inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value,
                "token_type_ids" => token_type_ids_value
            ])
            .map_err(|e| Error::Embedding(format!("ONNX inference failed: {}", e)))?;

        let (shape, data) = outputs["last_hidden_state"]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Embedding(format!("Failed to extract output tensor: {}", e)))?;

        // [1, seq_len, 384]
        if shape.len() != 3 {
            return Err(Error::Embedding(format!(
                "Unexpected output shape: expected 3 dimensions, got {}",
                shape.len()
            )));
        }

        let batch_size = shape[0];
        let seq_len = shape[1] as usize;
        let hidden_dim = shape[2] as usize;

        if batch_size != 1 || hidden_dim != MINILM_DIM {
            return Err(Error::Embedding(format!(
                "Unexpected output shape: got [{}, {}, {}], expected [1, {}, {}]",
                batch_size, seq_len, hidden_dim, seq_len, MINILM_DIM
            )));
        }

        let pooled = mean_pool(data, seq_len, hidden_dim, attention_mask);
        Ok(normalize_vector(pooled))
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| Error::Embedding("ONNX session lock poisoned".into()))
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut session = self.lock_session()?;
        self.embed_with(&mut session, text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut session = self.lock_session()?;
        texts
            .iter()
            .map(|text| self.embed_with(&mut session, text))
            .collect()
    }

    fn dim(&self) -> usize {
        MINILM_DIM
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }
}

fn mean_pool(data: &[f32], seq_len: usize, hidden_dim: usize, attention_mask: &[u32]) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut mask_sum = 0.0f32;

    for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask > 0 {
            let offset = i * hidden_dim;
            for (j, value) in pooled.iter_mut().enumerate() {
                *value += data[offset + j];
            }
            mask_sum += 1.0;
        }
    }

    if mask_sum > 0.0 {
        for val in pooled.iter_mut() {
            *val /= mask_sum;
        }
    }

    pooled
}

fn normalize_vector(mut vec: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec.iter_mut() {
            *val /= norm;
        }
    }
    vec
}
