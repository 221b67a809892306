//! Exact nearest-neighbour vector index.
//!
//! A flat Euclidean (L2) index: every stored vector is compared against the
//! query, so search is exact rather than approximate. Positions are assigned
//! sequentially by [`VectorIndex::add`] and never reused; they are what the
//! memory ledger references.

use crate::store::MemoryError;

/// Flat L2 index over fixed-dimension embeddings.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index for `dimension`-sized vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Rebuild an index from persisted vectors, validating every row.
    pub(crate) fn from_vectors(
        dimension: usize,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, MemoryError> {
        for v in &vectors {
            if v.len() != dimension {
                return Err(MemoryError::Dimension {
                    expected: dimension,
                    actual: v.len(),
                });
            }
        }
        Ok(Self { dimension, vectors })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Raw view of the stored vectors, in position order.
    pub(crate) fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Append `vector` and return its position.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize, MemoryError> {
        if vector.len() != self.dimension {
            return Err(MemoryError::Dimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Return up to `k` `(position, distance)` pairs nearest to `query`,
    /// ascending by distance; equal distances keep position order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, MemoryError> {
        if query.len() != self.dimension {
            return Err(MemoryError::Dimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, v)| (pos, l2_distance(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Euclidean distance between two equal-length vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── l2_distance ──────────────────────────────────────────────────────────

    #[test]
    fn distance_to_self_is_zero() {
        let v = vec![1.0f32, 2.0, 3.0];
        assert_eq!(l2_distance(&v, &v), 0.0);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = vec![0.0f32, 0.0];
        let b = vec![3.0f32, 4.0];
        assert!((l2_distance(&a, &b) - 5.0).abs() < 1e-6);
    }

    // ── add ──────────────────────────────────────────────────────────────────

    #[test]
    fn add_assigns_sequential_positions() {
        let mut index = VectorIndex::new(2);
        assert_eq!(index.add(vec![1.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add(vec![0.0, 1.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn add_rejects_wrong_dimension() {
        let mut index = VectorIndex::new(3);
        let err = index.add(vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Dimension {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    // ── search ───────────────────────────────────────────────────────────────

    #[test]
    fn search_orders_by_distance_ascending() {
        let mut index = VectorIndex::new(2);
        index.add(vec![0.0, 1.0]).unwrap(); // far
        index.add(vec![1.0, 0.0]).unwrap(); // exact
        index.add(vec![0.5, 0.5]).unwrap(); // middle

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
        assert_eq!(results[2].0, 0);
        assert!(results[0].1 < results[1].1);
        assert!(results[1].1 < results[2].1);
    }

    #[test]
    fn equal_distances_keep_position_order() {
        let mut index = VectorIndex::new(2);
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn search_truncates_to_k() {
        let mut index = VectorIndex::new(1);
        for i in 0..10 {
            index.add(vec![i as f32]).unwrap();
        }
        let results = index.search(&[0.0], 4).unwrap();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn search_returns_all_when_k_exceeds_len() {
        let mut index = VectorIndex::new(1);
        index.add(vec![1.0]).unwrap();
        let results = index.search(&[0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn search_on_empty_index_is_empty() {
        let index = VectorIndex::new(2);
        assert!(index.search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let index = VectorIndex::new(2);
        assert!(index.search(&[0.0], 5).is_err());
    }

    #[test]
    fn from_vectors_validates_every_row() {
        let err = VectorIndex::from_vectors(2, vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, MemoryError::Dimension { .. }));
    }
}
