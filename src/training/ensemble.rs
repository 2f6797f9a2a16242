//! Temporal Ensembling Store
//!
//! A fixed-size arena of embeddings keyed by a stable row index. Each row has
//! three slots:
//!
//! - `current`: the latest embedding written by a training step
//! - `accumulator`: exponential moving average of `current` across folds
//! - `target`: bias-corrected accumulator, read as the consistency target
//!
//! Steps only ever write `current`; `accumulator` and `target` change only in
//! [`TemporalEnsemble::fold`]. Targets read during epoch `e + 1` are therefore
//! the ones produced by the fold at the end of epoch `e`.

use burn::prelude::*;

use crate::utils::error::{HashError, Result};

#[derive(Debug, Clone)]
pub struct TemporalEnsemble {
    rows: usize,
    bits: usize,
    decay: f64,
    current: Vec<f32>,
    accumulator: Vec<f32>,
    target: Vec<f32>,
    touched: Vec<bool>,
    folds: usize,
}

impl TemporalEnsemble {
    /// Zero-initialised store of `rows` embeddings of length `bits`
    pub fn new(rows: usize, bits: usize, decay: f64) -> Result<Self> {
        if bits == 0 {
            return Err(HashError::InvalidInput("embedding length must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&decay) {
            return Err(HashError::InvalidInput(format!(
                "ensemble decay {} outside [0, 1)",
                decay
            )));
        }

        Ok(Self {
            rows,
            bits,
            decay,
            current: vec![0.0; rows * bits],
            accumulator: vec![0.0; rows * bits],
            target: vec![0.0; rows * bits],
            touched: vec![false; rows],
            folds: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Number of folds applied so far
    pub fn folds(&self) -> usize {
        self.folds
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(HashError::Shape(format!(
                "row {} out of range for store of {} rows",
                row, self.rows
            )));
        }
        Ok(())
    }

    /// Overwrite `current` for `rows` with row-major `embeddings`
    pub fn write_current(&mut self, rows: &[usize], embeddings: &[f32]) -> Result<()> {
        if embeddings.len() != rows.len() * self.bits {
            return Err(HashError::Shape(format!(
                "expected {} values for {} rows of {} bits, got {}",
                rows.len() * self.bits,
                rows.len(),
                self.bits,
                embeddings.len()
            )));
        }
        for &row in rows {
            self.check_row(row)?;
        }

        for (&row, values) in rows.iter().zip(embeddings.chunks_exact(self.bits)) {
            self.current[row * self.bits..(row + 1) * self.bits].copy_from_slice(values);
            self.touched[row] = true;
        }
        Ok(())
    }

    /// Commit a `[rows.len(), bits]` embedding tensor into `current`
    pub fn commit<B: Backend>(&mut self, rows: &[usize], embeddings: Tensor<B, 2>) -> Result<()> {
        let values: Vec<f32> = embeddings
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| HashError::Shape(format!("cannot read embeddings: {:?}", e)))?;
        self.write_current(rows, &values)
    }

    /// Fold `current` into the running average and refresh `target`.
    ///
    /// `accumulator ← d·accumulator + (1−d)·current`, then
    /// `target ← accumulator / (1 − d^(epoch+1))`.
    pub fn fold(&mut self, epoch: usize) {
        let d = self.decay as f32;
        let correction = 1.0 - self.decay.powi(epoch as i32 + 1);
        let correction = correction as f32;

        for ((acc, &cur), tgt) in self
            .accumulator
            .iter_mut()
            .zip(&self.current)
            .zip(self.target.iter_mut())
        {
            *acc = d * *acc + (1.0 - d) * cur;
            *tgt = *acc / correction;
        }
        self.folds += 1;
    }

    pub fn current_row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| &self.current[row * self.bits..(row + 1) * self.bits])
    }

    pub fn target_row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| &self.target[row * self.bits..(row + 1) * self.bits])
    }

    /// Whether `row` has been written by any step
    pub fn is_touched(&self, row: usize) -> bool {
        self.touched.get(row).copied().unwrap_or(false)
    }

    pub fn touched_count(&self) -> usize {
        self.touched.iter().filter(|&&t| t).count()
    }

    /// Gather targets for `rows` in order, row-major
    pub fn targets(&self, rows: &[usize]) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(rows.len() * self.bits);
        for &row in rows {
            self.check_row(row)?;
            out.extend_from_slice(&self.target[row * self.bits..(row + 1) * self.bits]);
        }
        Ok(out)
    }

    /// Targets for `rows` as a constant `[rows.len(), bits]` tensor
    pub fn targets_tensor<B: Backend>(&self, rows: &[usize], device: &B::Device) -> Result<Tensor<B, 2>> {
        let values = self.targets(rows)?;
        Ok(Tensor::from_data(
            TensorData::new(values, [rows.len(), self.bits]),
            device,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fold_cancels_bias() {
        let mut store = TemporalEnsemble::new(2, 3, 0.4).unwrap();
        store.write_current(&[1], &[0.5, -1.0, 2.0]).unwrap();
        store.fold(0);

        let target = store.target_row(1).unwrap();
        for (t, c) in target.iter().zip([0.5, -1.0, 2.0]) {
            assert!((t - c).abs() < 1e-6);
        }
        assert_eq!(store.target_row(0).unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_constant_input_converges() {
        let mut store = TemporalEnsemble::new(1, 2, 0.99).unwrap();
        store.write_current(&[0], &[0.3, -0.7]).unwrap();
        for epoch in 0..50 {
            store.fold(epoch);
            let t = store.target_row(0).unwrap();
            assert!((t[0] - 0.3).abs() < 1e-4);
            assert!((t[1] + 0.7).abs() < 1e-4);
        }
        assert_eq!(store.folds(), 50);
    }

    #[test]
    fn test_targets_lag_one_fold() {
        let mut store = TemporalEnsemble::new(1, 1, 0.4).unwrap();
        store.write_current(&[0], &[1.0]).unwrap();
        store.fold(0);
        store.write_current(&[0], &[5.0]).unwrap();
        // not folded yet: still the previous target
        assert_eq!(store.targets(&[0]).unwrap(), vec![1.0]);
        assert_eq!(store.current_row(0).unwrap(), &[5.0]);
    }

    #[test]
    fn test_write_validation() {
        let mut store = TemporalEnsemble::new(2, 2, 0.4).unwrap();
        assert!(store.write_current(&[0], &[1.0]).is_err());
        assert!(store.write_current(&[2], &[1.0, 1.0]).is_err());
        assert!(TemporalEnsemble::new(2, 2, 1.0).is_err());
    }

    #[test]
    fn test_touched_tracking() {
        let mut store = TemporalEnsemble::new(4, 1, 0.4).unwrap();
        store.write_current(&[3, 1], &[1.0, 2.0]).unwrap();
        assert!(store.is_touched(1));
        assert!(store.is_touched(3));
        assert!(!store.is_touched(0));
        assert_eq!(store.touched_count(), 2);
        assert_eq!(store.current_row(1).unwrap(), &[2.0]);
    }

    #[test]
    fn test_commit_tensor() {
        use burn_ndarray::NdArray;
        let device = Default::default();
        let mut store = TemporalEnsemble::new(3, 2, 0.4).unwrap();
        let embeddings =
            Tensor::<NdArray, 2>::from_data(TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]), &device);
        store.commit(&[2, 0], embeddings).unwrap();
        assert_eq!(store.current_row(2).unwrap(), &[1.0, 2.0]);
        assert_eq!(store.current_row(0).unwrap(), &[3.0, 4.0]);

        let targets = store.targets_tensor::<NdArray>(&[0, 1], &device).unwrap();
        assert_eq!(targets.dims(), [2, 2]);
    }
}
