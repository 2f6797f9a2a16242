//! Label partition and anchor selection
//!
//! Before training starts the training indices are partitioned once into a
//! labeled and an unlabeled pool, and a fixed anchor set is drawn from the
//! labeled pool. Both selections are class-balanced and reproducible from a seed.
//!
//! A separate helper carves a per-class query set out of the full data for
//! retrieval evaluation; everything else becomes the training/gallery set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{HashError, Result};

/// Labeled/unlabeled split of the training indices, fixed for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPartition {
    pub labeled_idx: Vec<usize>,
    pub unlabeled_idx: Vec<usize>,
    mask: Vec<bool>,
}

impl LabelPartition {
    /// Build a partition from an explicit labeled index list
    pub fn from_labeled(num_samples: usize, labeled_idx: Vec<usize>) -> Result<Self> {
        let mut mask = vec![false; num_samples];
        for &idx in &labeled_idx {
            if idx >= num_samples {
                return Err(HashError::Dataset(format!(
                    "labeled index {} out of range for {} samples",
                    idx, num_samples
                )));
            }
            if mask[idx] {
                return Err(HashError::Dataset(format!("labeled index {} repeated", idx)));
            }
            mask[idx] = true;
        }

        let unlabeled_idx = (0..num_samples).filter(|&i| !mask[i]).collect();

        Ok(Self {
            labeled_idx,
            unlabeled_idx,
            mask,
        })
    }

    /// Whether a training index carries its label
    pub fn is_labeled(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn num_samples(&self) -> usize {
        self.mask.len()
    }
}

/// Group indices by their class label
fn indices_by_class(labels: &[usize], candidates: impl Iterator<Item = usize>) -> Vec<Vec<usize>> {
    let num_classes = labels.iter().max().map(|m| m + 1).unwrap_or(0);
    let mut by_class = vec![Vec::new(); num_classes];
    for idx in candidates {
        by_class[labels[idx]].push(idx);
    }
    by_class
}

/// Draw `total` indices spread as evenly as possible over the classes.
///
/// Every class contributes `total / num_classes` indices, and the remainder is
/// taken round-robin from classes that still have unused candidates.
fn balanced_draw<R: Rng>(
    mut by_class: Vec<Vec<usize>>,
    total: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let available: usize = by_class.iter().map(Vec::len).sum();
    if total > available {
        return Err(HashError::Dataset(format!(
            "cannot draw {} indices from {} candidates",
            total, available
        )));
    }

    for class in by_class.iter_mut() {
        class.shuffle(rng);
    }

    let mut taken = vec![0usize; by_class.len()];
    let mut selected = Vec::with_capacity(total);

    // Round-robin over classes; exhausted classes are skipped.
    while selected.len() < total {
        for (class, indices) in by_class.iter().enumerate() {
            if selected.len() == total {
                break;
            }
            if taken[class] < indices.len() {
                selected.push(indices[taken[class]]);
                taken[class] += 1;
            }
        }
    }

    selected.sort_unstable();
    Ok(selected)
}

/// Select `labeled_total` class-balanced labeled indices; the rest are unlabeled
pub fn split_labeled<R: Rng>(
    labels: &[usize],
    labeled_total: usize,
    rng: &mut R,
) -> Result<LabelPartition> {
    let by_class = indices_by_class(labels, 0..labels.len());
    let labeled = balanced_draw(by_class, labeled_total, rng)?;
    LabelPartition::from_labeled(labels.len(), labeled)
}

/// Select a class-balanced anchor set from the labeled pool
pub fn select_anchors<R: Rng>(
    labels: &[usize],
    labeled_idx: &[usize],
    anchor_count: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if anchor_count == 0 {
        return Err(HashError::Dataset("anchor_count must be positive".to_string()));
    }
    let by_class = indices_by_class(labels, labeled_idx.iter().copied());
    balanced_draw(by_class, anchor_count, rng)
}

/// Query/training split of a full dataset for retrieval evaluation
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    pub query_idx: Vec<usize>,
    pub train_idx: Vec<usize>,
}

/// Hold out `per_class` samples of every class as queries
pub fn holdout_split<R: Rng>(labels: &[usize], per_class: usize, rng: &mut R) -> Result<HoldoutSplit> {
    let mut by_class = indices_by_class(labels, 0..labels.len());
    let mut query_idx = Vec::new();

    for (class, indices) in by_class.iter_mut().enumerate() {
        if indices.is_empty() {
            continue;
        }
        if indices.len() <= per_class {
            return Err(HashError::Dataset(format!(
                "class {} has {} samples, cannot hold out {}",
                class,
                indices.len(),
                per_class
            )));
        }
        indices.shuffle(rng);
        query_idx.extend_from_slice(&indices[..per_class]);
    }

    query_idx.sort_unstable();
    let mut is_query = vec![false; labels.len()];
    for &idx in &query_idx {
        is_query[idx] = true;
    }
    let train_idx = (0..labels.len()).filter(|&i| !is_query[i]).collect();

    Ok(HoldoutSplit {
        query_idx,
        train_idx,
    })
}
