//! In-memory image collection shared by every loader.

use serde::{Deserialize, Serialize};

use crate::utils::error::{HashError, Result};

/// A set of equally sized images stored as contiguous CHW bytes, with one
/// integer class label per image. The position of an image is its stable index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSet {
    pixels: Vec<u8>,
    labels: Vec<usize>,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl ImageSet {
    /// Build a set from flat CHW pixels and labels
    pub fn new(
        pixels: Vec<u8>,
        labels: Vec<usize>,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        let image_len = channels * height * width;
        if image_len == 0 {
            return Err(HashError::Dataset("image dimensions must be non-zero".to_string()));
        }

        if pixels.len() != labels.len() * image_len {
            return Err(HashError::Shape(format!(
                "{} pixel bytes do not match {} images of {}x{}x{}",
                pixels.len(),
                labels.len(),
                channels,
                height,
                width
            )));
        }

        Ok(Self {
            pixels,
            labels,
            channels,
            height,
            width,
        })
    }

    /// Empty set with the given image geometry
    pub fn empty(channels: usize, height: usize, width: usize) -> Self {
        Self {
            pixels: Vec::new(),
            labels: Vec::new(),
            channels,
            height,
            width,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bytes per image
    pub fn image_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    /// CHW bytes of one image
    pub fn image(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len() {
            return None;
        }
        let len = self.image_len();
        Some(&self.pixels[index * len..(index + 1) * len])
    }

    /// Append one image
    pub fn push(&mut self, image: &[u8], label: usize) -> Result<()> {
        if image.len() != self.image_len() {
            return Err(HashError::Shape(format!(
                "expected {} bytes per image, got {}",
                self.image_len(),
                image.len()
            )));
        }
        self.pixels.extend_from_slice(image);
        self.labels.push(label);
        Ok(())
    }

    /// Copy the selected images into a new set, re-indexed from zero
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let mut out = Self::empty(self.channels, self.height, self.width);
        out.pixels.reserve(indices.len() * self.image_len());

        for &idx in indices {
            let image = self
                .image(idx)
                .ok_or_else(|| HashError::Dataset(format!("index {} out of range", idx)))?;
            out.pixels.extend_from_slice(image);
            out.labels.push(self.labels[idx]);
        }

        Ok(out)
    }

    /// Number of classes implied by the largest label
    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map(|m| m + 1).unwrap_or(0)
    }

    /// Samples per class
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_mismatched_pixels() {
        assert!(ImageSet::new(vec![0; 11], vec![0, 1], 1, 2, 3).is_err());
        assert!(ImageSet::new(vec![0; 12], vec![0, 1], 1, 2, 3).is_ok());
    }

    #[test]
    fn test_subset_and_access() {
        let pixels: Vec<u8> = (0..12).collect();
        let set = ImageSet::new(pixels, vec![0, 1, 2], 1, 2, 2).unwrap();

        assert_eq!(set.image(1), Some(&[4u8, 5, 6, 7][..]));
        assert_eq!(set.image(3), None);

        let sub = set.subset(&[2, 0]).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.labels(), &[2, 0]);
        assert_eq!(sub.image(0), Some(&[8u8, 9, 10, 11][..]));
        assert!(set.subset(&[5]).is_err());
    }

    #[test]
    fn test_class_counts() {
        let set = ImageSet::new(vec![0; 4], vec![1, 1, 0, 3], 1, 1, 1).unwrap();
        assert_eq!(set.num_classes(), 4);
        assert_eq!(set.class_counts(), vec![1, 2, 0, 1]);
    }
}
