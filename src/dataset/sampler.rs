//! Two-stream batch sampler
//!
//! Every step draws a fixed quota of labeled indices alongside unlabeled ones.
//! Both streams are reshuffled independently at the start of each epoch and cut
//! into consecutive disjoint chunks; the epoch ends when the shorter stream runs
//! out of full chunks. No state survives from one epoch to the next.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::utils::error::{HashError, Result};

/// One step's worth of training indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBatch {
    /// Unlabeled indices, `unlabeled_per_batch` of them
    pub unlabeled: Vec<usize>,
    /// Labeled indices, `labeled_per_batch` of them
    pub labeled: Vec<usize>,
}

impl StepBatch {
    /// All indices of the step, unlabeled first
    pub fn indices(&self) -> Vec<usize> {
        self.unlabeled
            .iter()
            .chain(self.labeled.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.unlabeled.len() + self.labeled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sampler composing each batch from an unlabeled and a labeled stream
#[derive(Debug, Clone)]
pub struct TwoStreamSampler {
    unlabeled_idx: Vec<usize>,
    labeled_idx: Vec<usize>,
    unlabeled_per_batch: usize,
    labeled_per_batch: usize,
}

impl TwoStreamSampler {
    pub fn new(
        unlabeled_idx: Vec<usize>,
        labeled_idx: Vec<usize>,
        batch_size: usize,
        labeled_per_batch: usize,
    ) -> Result<Self> {
        if labeled_per_batch == 0 || labeled_per_batch >= batch_size {
            return Err(HashError::Config(format!(
                "labeled_per_batch must be in [1, {}), got {}",
                batch_size, labeled_per_batch
            )));
        }

        let unlabeled_per_batch = batch_size - labeled_per_batch;
        if unlabeled_idx.len() < unlabeled_per_batch || labeled_idx.len() < labeled_per_batch {
            return Err(HashError::Config(format!(
                "streams of {} unlabeled / {} labeled cannot fill one batch of {} + {}",
                unlabeled_idx.len(),
                labeled_idx.len(),
                unlabeled_per_batch,
                labeled_per_batch
            )));
        }

        Ok(Self {
            unlabeled_idx,
            labeled_idx,
            unlabeled_per_batch,
            labeled_per_batch,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.unlabeled_per_batch + self.labeled_per_batch
    }

    pub fn labeled_per_batch(&self) -> usize {
        self.labeled_per_batch
    }

    pub fn unlabeled_per_batch(&self) -> usize {
        self.unlabeled_per_batch
    }

    /// Number of full batches every epoch yields
    pub fn steps_per_epoch(&self) -> usize {
        (self.unlabeled_idx.len() / self.unlabeled_per_batch)
            .min(self.labeled_idx.len() / self.labeled_per_batch)
    }

    /// Shuffle both streams and return the batches of one epoch
    pub fn epoch<R: Rng>(&self, rng: &mut R) -> EpochBatches {
        let mut unlabeled = self.unlabeled_idx.clone();
        let mut labeled = self.labeled_idx.clone();
        unlabeled.shuffle(rng);
        labeled.shuffle(rng);

        EpochBatches {
            unlabeled,
            labeled,
            unlabeled_per_batch: self.unlabeled_per_batch,
            labeled_per_batch: self.labeled_per_batch,
            steps: self.steps_per_epoch(),
            cursor: 0,
        }
    }
}

/// Iterator over the batches of one shuffled epoch
#[derive(Debug, Clone)]
pub struct EpochBatches {
    unlabeled: Vec<usize>,
    labeled: Vec<usize>,
    unlabeled_per_batch: usize,
    labeled_per_batch: usize,
    steps: usize,
    cursor: usize,
}

impl Iterator for EpochBatches {
    type Item = StepBatch;

    fn next(&mut self) -> Option<StepBatch> {
        if self.cursor >= self.steps {
            return None;
        }

        let u = self.cursor * self.unlabeled_per_batch;
        let l = self.cursor * self.labeled_per_batch;
        self.cursor += 1;

        Some(StepBatch {
            unlabeled: self.unlabeled[u..u + self.unlabeled_per_batch].to_vec(),
            labeled: self.labeled[l..l + self.labeled_per_batch].to_vec(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EpochBatches {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn sampler() -> TwoStreamSampler {
        let labeled: Vec<usize> = (0..20).collect();
        let unlabeled: Vec<usize> = (20..100).collect();
        TwoStreamSampler::new(unlabeled, labeled, 10, 4).unwrap()
    }

    #[test]
    fn test_steps_per_epoch_limited_by_shorter_stream() {
        let sampler = sampler();
        // 80 / 6 = 13 unlabeled chunks, 20 / 4 = 5 labeled chunks
        assert_eq!(sampler.steps_per_epoch(), 5);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(sampler.epoch(&mut rng).count(), 5);
    }

    #[test]
    fn test_every_batch_has_fixed_quota_and_no_duplicates() {
        let sampler = sampler();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for batch in sampler.epoch(&mut rng) {
            assert_eq!(batch.labeled.len(), 4);
            assert_eq!(batch.unlabeled.len(), 6);
            assert!(batch.labeled.iter().all(|&i| i < 20));
            assert!(batch.unlabeled.iter().all(|&i| i >= 20));

            let unique: HashSet<usize> = batch.indices().into_iter().collect();
            assert_eq!(unique.len(), 10);
        }
    }

    #[test]
    fn test_no_index_reused_within_epoch() {
        let sampler = sampler();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let mut seen = HashSet::new();
        for batch in sampler.epoch(&mut rng) {
            for idx in batch.indices() {
                assert!(seen.insert(idx), "index {} drawn twice", idx);
            }
        }
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_epochs_are_reshuffled() {
        let sampler = sampler();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let first: Vec<StepBatch> = sampler.epoch(&mut rng).collect();
        let second: Vec<StepBatch> = sampler.epoch(&mut rng).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_rejects_invalid_quota() {
        assert!(TwoStreamSampler::new((0..10).collect(), (10..20).collect(), 4, 4).is_err());
        assert!(TwoStreamSampler::new((0..10).collect(), (10..20).collect(), 4, 0).is_err());
        assert!(TwoStreamSampler::new((0..2).collect(), (10..20).collect(), 6, 2).is_err());
    }
}
