//! Anchor Manager
//!
//! Anchors are a fixed, labeled subset of the training set that every batch is
//! compared against. Once per epoch the manager materialises the anchor images
//! (augmented like any training item); every step draws a fresh random subset
//! of anchor positions to form the in-step anchor batch. Anchor embeddings have
//! their own temporal ensemble, indexed by anchor position.

use burn::data::dataset::Dataset;
use burn::prelude::*;
use rand::seq::index;
use rand::Rng;
use tracing::debug;

use super::ensemble::TemporalEnsemble;
use crate::dataset::{Augmentation, HashDataset, HashItem};
use crate::utils::error::{HashError, Result, ResultExt};

/// Anchors drawn for one training step
#[derive(Debug, Clone)]
pub struct AnchorDraw {
    /// Positions into the anchor set (rows of the anchor ensemble)
    pub positions: Vec<usize>,
    pub labels: Vec<usize>,
    pub items: Vec<HashItem>,
}

#[derive(Debug, Clone)]
pub struct AnchorManager {
    anchor_idx: Vec<usize>,
    labels: Vec<usize>,
    subsample: usize,
    epoch_items: Vec<HashItem>,
    store: TemporalEnsemble,
}

impl AnchorManager {
    /// Create a manager over `anchor_idx` (training indices) with labels taken from `all_labels`
    pub fn new(
        anchor_idx: Vec<usize>,
        all_labels: &[usize],
        bits: usize,
        decay: f64,
        subsample: usize,
    ) -> Result<Self> {
        if anchor_idx.is_empty() {
            return Err(HashError::InvalidInput("anchor set is empty".to_string()));
        }
        if subsample == 0 || subsample > anchor_idx.len() {
            return Err(HashError::InvalidInput(format!(
                "cannot draw {} anchors per step from {}",
                subsample,
                anchor_idx.len()
            )));
        }

        let labels = anchor_idx
            .iter()
            .map(|&i| {
                all_labels
                    .get(i)
                    .copied()
                    .with_context(|| format!("anchor index {} out of range", i))
            })
            .collect::<Result<Vec<_>>>()?;

        let store = TemporalEnsemble::new(anchor_idx.len(), bits, decay)?;

        Ok(Self {
            anchor_idx,
            labels,
            subsample,
            epoch_items: Vec::new(),
            store,
        })
    }

    pub fn len(&self) -> usize {
        self.anchor_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor_idx.is_empty()
    }

    pub fn anchor_idx(&self) -> &[usize] {
        &self.anchor_idx
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn subsample(&self) -> usize {
        self.subsample
    }

    pub fn store(&self) -> &TemporalEnsemble {
        &self.store
    }

    /// Materialise this epoch's anchor images in anchor order
    pub fn refresh<R: Rng>(
        &mut self,
        dataset: &HashDataset,
        augmentation: Option<&Augmentation>,
        rng: &mut R,
    ) -> Result<()> {
        let mut items = Vec::with_capacity(self.anchor_idx.len());
        for &idx in &self.anchor_idx {
            let item = match augmentation {
                Some(aug) => dataset.get_augmented(idx, aug, rng),
                None => dataset.get(idx),
            };
            items.push(item.ok_or_else(|| {
                HashError::Dataset(format!("anchor index {} missing from dataset", idx))
            })?);
        }
        debug!("Refreshed {} anchor images", items.len());
        self.epoch_items = items;
        Ok(())
    }

    /// Draw `subsample` distinct anchors for one step
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Result<AnchorDraw> {
        if self.epoch_items.len() != self.anchor_idx.len() {
            return Err(HashError::Training(
                "anchors must be refreshed before drawing".to_string(),
            ));
        }

        let positions = index::sample(rng, self.anchor_idx.len(), self.subsample).into_vec();
        let labels = positions.iter().map(|&p| self.labels[p]).collect();
        let items = positions.iter().map(|&p| self.epoch_items[p].clone()).collect();

        Ok(AnchorDraw {
            positions,
            labels,
            items,
        })
    }

    /// Ensembled targets for the drawn anchor positions
    pub fn targets<B: Backend>(&self, positions: &[usize], device: &B::Device) -> Result<Tensor<B, 2>> {
        self.store.targets_tensor(positions, device)
    }

    /// Record this step's anchor embeddings
    pub fn commit<B: Backend>(&mut self, positions: &[usize], embeddings: Tensor<B, 2>) -> Result<()> {
        self.store.commit(positions, embeddings)
    }

    /// Fold the anchor ensemble
    pub fn fold(&mut self, epoch: usize) {
        self.store.fold(epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::{generate, SyntheticConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn dataset() -> HashDataset {
        let config = SyntheticConfig {
            samples: 30,
            side: 4,
            ..Default::default()
        };
        HashDataset::new(generate(&config).unwrap())
    }

    #[test]
    fn test_draw_requires_refresh() {
        let data = dataset();
        let manager = AnchorManager::new(vec![0, 1, 2, 3], data.labels(), 8, 0.99, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(manager.draw(&mut rng).is_err());
    }

    #[test]
    fn test_draw_distinct_positions() {
        let data = dataset();
        let anchors = vec![0, 3, 5, 11, 12, 20];
        let mut manager = AnchorManager::new(anchors.clone(), data.labels(), 8, 0.99, 4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        manager.refresh(&data, Some(&Augmentation::default()), &mut rng).unwrap();

        for _ in 0..10 {
            let draw = manager.draw(&mut rng).unwrap();
            assert_eq!(draw.positions.len(), 4);
            let unique: HashSet<_> = draw.positions.iter().collect();
            assert_eq!(unique.len(), 4);
            for (k, &p) in draw.positions.iter().enumerate() {
                assert_eq!(draw.items[k].index, anchors[p]);
                assert_eq!(draw.labels[k], data.labels()[anchors[p]]);
            }
        }
    }

    #[test]
    fn test_invalid_subsample() {
        let data = dataset();
        assert!(AnchorManager::new(vec![0, 1], data.labels(), 8, 0.99, 3).is_err());
        assert!(AnchorManager::new(vec![0, 99], data.labels(), 8, 0.99, 1).is_err());
        assert!(AnchorManager::new(vec![], data.labels(), 8, 0.99, 1).is_err());
    }
}
