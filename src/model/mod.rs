//! Model module for hashing networks and run configuration
//!
//! This module provides:
//! - The [`FeatureExtractor`] seam the trainer depends on
//! - A compact CNN hashing network built with Burn
//! - Run configuration and validation

pub mod cnn;
pub mod config;

use burn::tensor::{backend::Backend, Tensor};

pub use cnn::{HashNet, HashNetConfig};
pub use config::{AnchorFold, HashTrainingConfig};

/// A differentiable network mapping images to real-valued hash embeddings.
///
/// Any Burn module implementing this trait can be trained by the
/// [`Trainer`](crate::training::Trainer).
pub trait FeatureExtractor<B: Backend> {
    /// Embed a batch of images of shape [n, channels, height, width] into [n, num_bits]
    fn embed(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Length of the produced embedding
    fn num_bits(&self) -> usize;
}
