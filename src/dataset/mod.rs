//! Dataset module for semi-supervised hashing
//!
//! This module provides functionality for:
//! - Loading images (CIFAR-10 binary, class-per-folder images, synthetic clusters)
//! - Partitioning training indices into labeled/unlabeled pools and anchors
//! - Two-stream batch sampling with a guaranteed labeled quota
//! - Burn `Dataset`/`Batcher` integration
//!
//! ## Index Model
//!
//! A sample's position in the training [`ImageSet`] is its stable index. The
//! label mask, the anchor set, the sampler and the ensemble stores all speak
//! in these indices.

pub mod burn_dataset;
pub mod cifar10;
pub mod folder;
pub mod image_set;
pub mod sampler;
pub mod split;
pub mod synthetic;

pub use burn_dataset::{Augmentation, HashBatch, HashBatcher, HashDataset, HashItem, Normalization};
pub use image_set::ImageSet;
pub use sampler::{StepBatch, TwoStreamSampler};
pub use split::{holdout_split, select_anchors, split_labeled, HoldoutSplit, LabelPartition};
