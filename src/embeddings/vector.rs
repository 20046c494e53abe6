// ABOUTME: Dense embedding matrix with brute-force similarity scoring
// ABOUTME: Linear scan over every row; first maximum wins on ties

use crate::config::Metric;
use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    rows: Array2<f32>,
    norms: Array1<f32>,
}

impl EmbeddingMatrix {
    pub fn from_rows(rows: Vec<Vec<f32>>, dim: usize) -> Result<Self> {
        let count = rows.len();
        let mut flat = Vec::with_capacity(count * dim);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(Error::Embedding(format!(
                    "Vector dimension mismatch at row {}: expected {}, got {}",
                    i,
                    dim,
                    row.len()
                )));
            }
            flat.extend(row);
        }

        let rows = Array2::from_shape_vec((count, dim), flat)
            .map_err(|e| Error::Embedding(format!("Failed to shape embedding matrix: {}", e)))?;
        let norms = rows.map_axis(Axis(1), |row| row.dot(&row).sqrt());

        Ok(EmbeddingMatrix { rows, norms })
    }

    pub fn dim(&self) -> usize {
        self.rows.ncols()
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.rows.row(index)
    }

    /// Similarity of `query` against every row, in row order.
    pub fn scores(&self, query: &[f32], metric: Metric) -> Result<Array1<f32>> {
        if query.len() != self.dim() {
            return Err(Error::Embedding(format!(
                "Query vector dimension mismatch: expected {}, got {}",
                self.dim(),
                query.len()
            )));
        }

        let query = ArrayView1::from(query);
        let dots = self.rows.dot(&query);

        match metric {
            Metric::Dot => Ok(dots),
            Metric::Cosine => {
                let query_norm = query.dot(&query).sqrt();
                Ok(ndarray::Zip::from(&dots)
                    .and(&self.norms)
                    .map_collect(|&dot, &norm| {
                        if norm == 0.0 || query_norm == 0.0 {
                            0.0
                        } else {
                            dot / (norm * query_norm)
                        }
                    }))
            }
        }
    }
}

/// Highest score within `range`, keeping the earliest row on ties.
/// NaN scores are never selected.
pub fn first_max(scores: &Array1<f32>, range: Range<usize>) -> Option<(usize, f32)> {
    let end = range.end.min(scores.len());
    let mut best: Option<(usize, f32)> = None;

    for i in range.start..end {
        let score = scores[i];
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best
}
