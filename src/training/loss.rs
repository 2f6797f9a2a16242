//! Semi-supervised pairwise hashing loss
//!
//! Combines a pairwise term driven by label similarity with a consistency term
//! driven by the temporally ensembled embeddings:
//!
//! - labeled rows against anchors: binary cross-entropy of `σ(θ)` vs `S`
//! - labeled rows against each other: `(h·hᵀ/bits − W)²`, scaled by `gamma`
//! - unlabeled rows against anchors: `(σ(θ) − σ(θ̃))²`, where `θ̃` comes from the
//!   ensembled targets
//! - every row and every anchor: squared distance to its ensembled target
//!
//! `total = pairwise + w · consistency`.

use burn::prelude::*;
use burn::tensor::activation::sigmoid;
use burn::tensor::ElementConversion;

const PROB_EPS: f64 = 1e-6;

/// Everything one step feeds into the loss
#[derive(Debug, Clone)]
pub struct LossInputs<B: Backend> {
    /// Batch embeddings [n, bits]
    pub batch: Tensor<B, 2>,
    /// Anchor sub-batch embeddings [m, bits]
    pub anchors: Tensor<B, 2>,
    /// Ensembled targets for the batch rows [n, bits]
    pub batch_targets: Tensor<B, 2>,
    /// Ensembled targets for the anchor rows [m, bits]
    pub anchor_targets: Tensor<B, 2>,
    /// Batch × anchor similarity, restricted to labeled rows [|L|, m]
    pub anchor_similarity: Tensor<B, 2>,
    /// Labeled × labeled ±1 weights [|L|, |L|]
    pub labeled_weight: Tensor<B, 2>,
    /// Row positions of labeled samples in `batch`
    pub labeled_rows: Vec<usize>,
    /// Row positions of unlabeled samples in `batch`
    pub unlabeled_rows: Vec<usize>,
    /// Already-scaled consistency weight
    pub consistency_weight: f64,
}

/// Scalar loss tensors for one step
#[derive(Debug, Clone)]
pub struct LossOutput<B: Backend> {
    pub total: Tensor<B, 1>,
    pub pairwise: Tensor<B, 1>,
    pub consistency: Tensor<B, 1>,
}

impl<B: Backend> LossOutput<B> {
    /// Host copies of `(total, pairwise, consistency)`
    pub fn values(&self) -> (f64, f64, f64) {
        (
            self.total.clone().into_scalar().elem::<f64>(),
            self.pairwise.clone().into_scalar().elem::<f64>(),
            self.consistency.clone().into_scalar().elem::<f64>(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct HashLoss {
    num_bits: usize,
    logit_scale: f64,
    gamma: f64,
}

fn rows<B: Backend>(tensor: Tensor<B, 2>, rows: &[usize]) -> Tensor<B, 2> {
    let device = tensor.device();
    let idx: Vec<i64> = rows.iter().map(|&r| r as i64).collect();
    let idx = Tensor::<B, 1, Int>::from_data(TensorData::new(idx, [rows.len()]), &device);
    tensor.select(0, idx)
}

impl HashLoss {
    pub fn new(num_bits: usize, logit_scale: f64, gamma: f64) -> Self {
        Self {
            num_bits,
            logit_scale,
            gamma,
        }
    }

    /// Similarity probabilities `σ(scale · a · bᵀ)`
    pub fn similarity_probs<B: Backend>(&self, a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(a.matmul(b.transpose()).mul_scalar(self.logit_scale))
    }

    pub fn forward<B: Backend>(&self, inputs: LossInputs<B>) -> LossOutput<B> {
        let LossInputs {
            batch,
            anchors,
            batch_targets,
            anchor_targets,
            anchor_similarity,
            labeled_weight,
            labeled_rows,
            unlabeled_rows,
            consistency_weight,
        } = inputs;
        let device = batch.device();

        let h_l = rows(batch.clone(), &labeled_rows);

        // labeled rows vs anchors
        let y_l = self
            .similarity_probs(h_l.clone(), anchors.clone())
            .clamp(PROB_EPS, 1.0 - PROB_EPS);
        let bce = (anchor_similarity.clone() * y_l.clone().log()
            + anchor_similarity.neg().add_scalar(1.0) * y_l.neg().add_scalar(1.0).log())
        .neg()
        .mean();

        // labeled rows vs labeled rows
        let inner = h_l.clone().matmul(h_l.transpose()).div_scalar(self.num_bits as f64);
        let labeled_term = (inner - labeled_weight).powf_scalar(2.0).mean();

        let pairwise = bce + labeled_term.mul_scalar(self.gamma);

        // unlabeled rows vs anchors, against the ensembled similarities
        let unlabeled_term = if unlabeled_rows.is_empty() {
            Tensor::<B, 1>::zeros([1], &device)
        } else {
            let y_u = self.similarity_probs(rows(batch.clone(), &unlabeled_rows), anchors.clone());
            let y_t = self.similarity_probs(
                rows(batch_targets.clone(), &unlabeled_rows),
                anchor_targets.clone(),
            );
            (y_u - y_t).powf_scalar(2.0).mean()
        };

        let drift = (batch - batch_targets).powf_scalar(2.0).mean()
            + (anchors - anchor_targets).powf_scalar(2.0).mean();
        let consistency = drift + unlabeled_term;

        let total = pairwise.clone() + consistency.clone().mul_scalar(consistency_weight);

        LossOutput {
            total,
            pairwise,
            consistency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::similarity::build_similarity;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn tensor<B: Backend>(values: Vec<f32>, shape: [usize; 2]) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    fn inputs<B: Backend>(batch: Vec<f32>, weight: f64) -> LossInputs<B> {
        // rows 0 (unlabeled) and 1, 2 (labeled); two anchors; 2 bits
        let batch_labels = [0usize, 1];
        let anchor_labels = [0usize, 1];
        let anchor_pair = build_similarity(&batch_labels, &anchor_labels, 2).unwrap();
        let labeled_pair = build_similarity(&batch_labels, &batch_labels, 2).unwrap();
        let device = Default::default();
        let (s, _) = anchor_pair.to_tensors::<B>(&device);
        let (_, w) = labeled_pair.to_tensors::<B>(&device);

        LossInputs {
            batch: tensor(batch, [3, 2]),
            anchors: tensor(vec![0.9, 0.9, -0.9, -0.9], [2, 2]),
            batch_targets: tensor(vec![0.0; 6], [3, 2]),
            anchor_targets: tensor(vec![0.0; 4], [2, 2]),
            anchor_similarity: s,
            labeled_weight: w,
            labeled_rows: vec![1, 2],
            unlabeled_rows: vec![0],
            consistency_weight: weight,
        }
    }

    #[test]
    fn test_loss_is_finite() {
        let loss = HashLoss::new(2, 0.4 * 24.0, 0.1);
        let out = loss.forward(inputs::<TestBackend>(vec![0.5, -0.2, 0.9, 0.8, -0.7, -0.9], 20.0));
        let (total, pairwise, consistency) = out.values();
        assert!(total.is_finite() && pairwise.is_finite() && consistency.is_finite());
        assert!((total - (pairwise + 20.0 * consistency)).abs() < 1e-4);
    }

    #[test]
    fn test_agreeing_codes_score_lower() {
        let loss = HashLoss::new(2, 2.0, 0.1);
        let good = loss.forward(inputs::<TestBackend>(vec![0.0, 0.0, 0.9, 0.9, -0.9, -0.9], 0.0));
        let bad = loss.forward(inputs::<TestBackend>(vec![0.0, 0.0, -0.9, -0.9, 0.9, 0.9], 0.0));
        assert!(good.values().1 < bad.values().1);
    }

    #[test]
    fn test_zero_weight_ignores_consistency() {
        let loss = HashLoss::new(2, 2.0, 0.1);
        let out = loss.forward(inputs::<TestBackend>(vec![0.3, 0.1, 0.9, 0.9, -0.9, -0.9], 0.0));
        let (total, pairwise, consistency) = out.values();
        assert!(consistency > 0.0);
        assert!((total - pairwise).abs() < 1e-6);
    }

    #[test]
    fn test_backward_reaches_embeddings() {
        type AD = Autodiff<NdArray>;
        let mut inp = inputs::<AD>(vec![0.3, 0.1, 0.9, 0.9, -0.9, -0.9], 1.0);
        inp.batch = inp.batch.require_grad();
        let batch = inp.batch.clone();

        let out = HashLoss::new(2, 2.0, 0.1).forward(inp);
        let grads = out.total.backward();
        let grad = batch.grad(&grads).unwrap();
        assert_eq!(grad.dims(), [3, 2]);
    }
}
