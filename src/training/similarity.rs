//! Pairwise similarity targets
//!
//! Turns two label lists into a 0/1 similarity matrix `S` (shared class) and a
//! ±1 weight matrix `W`. Matrices are built host-side, row-major, and uploaded
//! as tensors when a step needs them.

use burn::prelude::*;

use crate::utils::error::{HashError, Result};

/// One-hot encode `labels` into a row-major `[labels.len(), num_classes]` matrix
pub fn one_hot(labels: &[usize], num_classes: usize) -> Result<Vec<f32>> {
    let mut encoded = vec![0.0f32; labels.len() * num_classes];
    for (row, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(HashError::InvalidInput(format!(
                "label {} out of range for {} classes",
                label, num_classes
            )));
        }
        encoded[row * num_classes + label] = 1.0;
    }
    Ok(encoded)
}

/// Similarity `S` and weight `W` matrices for two label sets
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityPair {
    pub rows: usize,
    pub cols: usize,
    /// 1 where the rows share a class, else 0
    pub similarity: Vec<f32>,
    /// +1 where `similarity` is 1, else -1
    pub weight: Vec<f32>,
}

impl SimilarityPair {
    pub fn s(&self, i: usize, j: usize) -> f32 {
        self.similarity[i * self.cols + j]
    }

    pub fn w(&self, i: usize, j: usize) -> f32 {
        self.weight[i * self.cols + j]
    }

    /// Upload `(S, W)` as `[rows, cols]` tensors
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let shape = [self.rows, self.cols];
        (
            Tensor::from_data(TensorData::new(self.similarity.clone(), shape), device),
            Tensor::from_data(TensorData::new(self.weight.clone(), shape), device),
        )
    }
}

/// Build `S = 1[onehot(A) · onehot(B)ᵀ > 0]` and `W = 2S - 1`
pub fn build_similarity(
    labels_a: &[usize],
    labels_b: &[usize],
    num_classes: usize,
) -> Result<SimilarityPair> {
    let a = one_hot(labels_a, num_classes)?;
    let b = one_hot(labels_b, num_classes)?;
    let (rows, cols) = (labels_a.len(), labels_b.len());

    let mut similarity = vec![0.0f32; rows * cols];
    for i in 0..rows {
        let row_a = &a[i * num_classes..(i + 1) * num_classes];
        for j in 0..cols {
            let row_b = &b[j * num_classes..(j + 1) * num_classes];
            let dot: f32 = row_a.iter().zip(row_b).map(|(x, y)| x * y).sum();
            if dot > 0.0 {
                similarity[i * cols + j] = 1.0;
            }
        }
    }
    let weight = similarity.iter().map(|&s| if s > 0.0 { 1.0 } else { -1.0 }).collect();

    Ok(SimilarityPair {
        rows,
        cols,
        similarity,
        weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_one_hot() {
        let encoded = one_hot(&[2, 0], 3).unwrap();
        assert_eq!(encoded, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(one_hot(&[3], 3).is_err());
    }

    #[test]
    fn test_single_sample_keeps_shape() {
        let pair = build_similarity(&[4], &[4, 1, 4], 10).unwrap();
        assert_eq!((pair.rows, pair.cols), (1, 3));
        assert_eq!(pair.similarity, vec![1.0, 0.0, 1.0]);

        let (s, w) = pair.to_tensors::<NdArray>(&Default::default());
        assert_eq!(s.dims(), [1, 3]);
        assert_eq!(w.dims(), [1, 3]);
    }

    #[test]
    fn test_similarity_matches_label_equality() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let n = rng.gen_range(1..12);
            let m = rng.gen_range(1..12);
            let a: Vec<usize> = (0..n).map(|_| rng.gen_range(0..5)).collect();
            let b: Vec<usize> = (0..m).map(|_| rng.gen_range(0..5)).collect();

            let pair = build_similarity(&a, &b, 5).unwrap();
            assert_eq!(pair.similarity.len(), n * m);
            for i in 0..n {
                for j in 0..m {
                    let same = a[i] == b[j];
                    assert_eq!(pair.s(i, j) == 1.0, same);
                    assert_eq!(pair.w(i, j) == 1.0, same);
                    assert!(pair.w(i, j) == 1.0 || pair.w(i, j) == -1.0);
                }
            }
        }
    }

    #[test]
    fn test_empty_side() {
        let pair = build_similarity(&[], &[1, 2], 3).unwrap();
        assert_eq!(pair.rows, 0);
        assert!(pair.similarity.is_empty());
    }
}
