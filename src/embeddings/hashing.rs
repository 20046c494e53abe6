// ABOUTME: Deterministic feature-hashing embedder over words and character trigrams
// ABOUTME: Needs no model files; lexical variants of a line stay close in vector space

use super::Embedder;
use crate::Result;
use rayon::prelude::*;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        HashEmbedder {
            dim,
            model_id: format!("fnv1a-hash-v1-{}", dim),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let slot = (hash % self.dim as u64) as usize;
        // Top bit picks the sign so collisions cancel instead of pile up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[slot] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];

        for word in normalize(text).split_whitespace() {
            let mut key = Vec::with_capacity(word.len() + 2);
            key.extend_from_slice(b"w:");
            key.extend_from_slice(word.as_bytes());
            self.add_feature(&mut vector, &key, WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        Ok(normalize_vector(vector))
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.par_iter().map(|text| self.embed(text)).collect()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Lowercase, keep letters and digits, everything else becomes a space.
fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Ding, Dang!"), "ding  dang ");
    }

    #[test]
    fn test_unit_length() {
        let embedder = HashEmbedder::new(128);
        let v = embedder.embed("Twinkle twinkle little star").unwrap();
        let length: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("  ?! ").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("Row, row, row your boat").unwrap();
        let b = embedder.embed("row row row your boat").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plural_stays_close() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("Twinkle twinkle little star").unwrap();
        let b = embedder.embed("twinkle twinkle little stars").unwrap();
        assert!(dot(&a, &b) > 0.8, "similarity {}", dot(&a, &b));
    }

    #[test]
    fn test_unrelated_text_is_far() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("Twinkle twinkle little star").unwrap();
        let b = embedder.embed("quartz jukebox xylophone").unwrap();
        assert!(dot(&a, &b) < 0.3);
    }

    #[test]
    fn test_embed_many_matches_embed() {
        let embedder = HashEmbedder::new(64);
        let texts = ["one line", "another line", "third"];
        let batch = embedder.embed_many(&texts).unwrap();
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&embedder.embed(text).unwrap(), vector);
        }
    }

    #[test]
    fn test_model_id_includes_dim() {
        assert_eq!(HashEmbedder::new(32).model_id(), "fnv1a-hash-v1-32");
        assert_eq!(HashEmbedder::new(0).dim(), 1);
    }
}
