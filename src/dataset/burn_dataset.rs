//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` trait over an in-memory [`ImageSet`] and a
//! `Batcher` that stacks items into normalized image tensors. Every item keeps
//! its stable training index so per-sample state can be joined back to it.

use std::sync::Arc;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::image_set::ImageSet;

/// One sample ready for batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HashItem {
    /// Image data as flattened CHW floats in [0, 1]
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
    /// Stable index into the training set
    pub index: usize,
}

/// Training-time augmentation: random horizontal flip and a reflect-padded shift
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Augmentation {
    /// Probability of mirroring the image left-right
    pub flip_prob: f64,
    /// Maximum translation in pixels along each axis
    pub max_shift: usize,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            flip_prob: 0.5,
            max_shift: 2,
        }
    }
}

/// Mirror an out-of-range coordinate back into [0, len)
fn reflect(pos: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut p = pos.rem_euclid(period);
    if p >= len {
        p = period - p;
    }
    p as usize
}

impl Augmentation {
    /// Apply the augmentation to a CHW float image in place
    pub fn apply<R: Rng>(
        &self,
        image: &mut [f32],
        channels: usize,
        height: usize,
        width: usize,
        rng: &mut R,
    ) {
        let flip = self.flip_prob > 0.0 && rng.gen_bool(self.flip_prob.min(1.0));
        let shift = self.max_shift as isize;
        let (dy, dx) = if shift > 0 {
            (rng.gen_range(-shift..=shift), rng.gen_range(-shift..=shift))
        } else {
            (0, 0)
        };

        if !flip && dy == 0 && dx == 0 {
            return;
        }

        let source = image.to_vec();
        let plane = height * width;
        for c in 0..channels {
            for y in 0..height {
                let sy = reflect(y as isize + dy, height);
                for x in 0..width {
                    let fx = if flip { width - 1 - x } else { x };
                    let sx = reflect(fx as isize + dx, width);
                    image[c * plane + y * width + x] = source[c * plane + sy * width + sx];
                }
            }
        }
    }
}

/// Dataset over an in-memory image set
#[derive(Debug, Clone)]
pub struct HashDataset {
    images: Arc<ImageSet>,
}

impl HashDataset {
    pub fn new(images: ImageSet) -> Self {
        Self {
            images: Arc::new(images),
        }
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn labels(&self) -> &[usize] {
        self.images.labels()
    }

    /// Fetch an item and augment it with the caller's RNG
    pub fn get_augmented<R: Rng>(
        &self,
        index: usize,
        augmentation: &Augmentation,
        rng: &mut R,
    ) -> Option<HashItem> {
        let mut item = self.get(index)?;
        augmentation.apply(
            &mut item.image,
            self.images.channels,
            self.images.height,
            self.images.width,
            rng,
        );
        Some(item)
    }
}

impl Dataset<HashItem> for HashDataset {
    fn get(&self, index: usize) -> Option<HashItem> {
        let pixels = self.images.image(index)?;
        Some(HashItem {
            image: pixels.iter().map(|&p| p as f32 / 255.0).collect(),
            label: self.images.label(index)?,
            index,
        })
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

/// Per-channel normalization statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Normalization {
    /// CIFAR-10 channel statistics
    pub fn cifar10() -> Self {
        Self {
            mean: vec![0.491, 0.482, 0.447],
            std: vec![0.247, 0.243, 0.262],
        }
    }

    /// CIFAR-10 statistics for RGB input, centred otherwise
    pub fn for_channels(channels: usize) -> Self {
        if channels == 3 {
            Self::cifar10()
        } else {
            Self::centered(channels)
        }
    }

    /// Map [0, 1] to roughly [-1, 1] on every channel
    pub fn centered(channels: usize) -> Self {
        Self {
            mean: vec![0.5; channels],
            std: vec![0.5; channels],
        }
    }
}

/// A batch of images with host-side labels and training indices
#[derive(Clone, Debug)]
pub struct HashBatch<B: Backend> {
    /// Images with shape [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,
    pub labels: Vec<usize>,
    pub indices: Vec<usize>,
}

impl<B: Backend> HashBatch<B> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Batcher stacking [`HashItem`]s into normalized tensors
#[derive(Clone, Debug)]
pub struct HashBatcher {
    channels: usize,
    height: usize,
    width: usize,
    normalization: Normalization,
}

impl HashBatcher {
    pub fn new(channels: usize, height: usize, width: usize, normalization: Normalization) -> Self {
        Self {
            channels,
            height,
            width,
            normalization,
        }
    }

    /// Batcher matching the geometry of an image set
    pub fn for_images(images: &ImageSet, normalization: Normalization) -> Self {
        Self::new(images.channels, images.height, images.width, normalization)
    }
}

impl<B: Backend> Batcher<B, HashItem, HashBatch<B>> for HashBatcher {
    fn batch(&self, items: Vec<HashItem>, device: &B::Device) -> HashBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(images_data, [batch_size, self.channels, self.height, self.width]),
            device,
        );

        let mean = Tensor::<B, 4>::from_data(
            TensorData::new(self.normalization.mean.clone(), [1, self.channels, 1, 1]),
            device,
        );
        let std = Tensor::<B, 4>::from_data(
            TensorData::new(self.normalization.std.clone(), [1, self.channels, 1, 1]),
            device,
        );
        let images = (images - mean) / std;

        HashBatch {
            images,
            labels: items.iter().map(|item| item.label).collect(),
            indices: items.iter().map(|item| item.index).collect(),
        }
    }
}
