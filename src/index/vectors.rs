//! Exact nearest-neighbour index over squared L2 distance

use crate::errors::{RagError, Result};
use crate::types::Vector;

/// Flat row-major vector index. Row `i` belongs to passage `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build from equally sized, non-empty vectors
    pub fn build(vectors: &[Vector]) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(RagError::Configuration(
                "cannot build an index from zero-length or missing vectors".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for v in vectors {
            if v.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: v.len(),
                });
            }
            data.extend_from_slice(v);
        }

        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension)
    }

    /// The `k` nearest rows as (row, squared distance), ascending; ties by row
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows()
            .enumerate()
            .map(|(i, row)| (i, squared_l2(row, query)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
