//! Image folder loader
//!
//! Reads a dataset laid out as one subdirectory per class:
//!
//! ```text
//! root_dir/
//! ├── class_a/
//! │   ├── image1.jpg
//! │   └── image2.png
//! └── class_b/
//!     └── ...
//! ```
//!
//! Class indices follow the sorted directory names. Every image is resized to a
//! square of the requested side and stored as CHW RGB bytes.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageReader;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::image_set::ImageSet;
use crate::utils::error::{HashError, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Class names discovered under `root_dir`, sorted
pub fn class_names(root_dir: &Path) -> Result<Vec<String>> {
    if !root_dir.exists() {
        return Err(HashError::PathNotFound(root_dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decode, resize and convert one image to CHW RGB bytes
pub fn load_chw(path: &Path, side: usize) -> Result<Vec<u8>> {
    let rgb = ImageReader::open(path)?
        .decode()?
        .resize_exact(side as u32, side as u32, FilterType::Triangle)
        .to_rgb8();

    let plane = side * side;
    let mut chw = vec![0u8; 3 * plane];
    for (i, pixel) in rgb.pixels().enumerate() {
        chw[i] = pixel[0];
        chw[plane + i] = pixel[1];
        chw[2 * plane + i] = pixel[2];
    }
    Ok(chw)
}

/// Load a class-per-directory dataset into memory
pub fn load_image_folder(root_dir: &Path, side: usize) -> Result<ImageSet> {
    let classes = class_names(root_dir)?;
    if classes.is_empty() {
        return Err(HashError::Dataset(format!(
            "no class directories under {:?}",
            root_dir
        )));
    }
    info!("Found {} classes under {:?}", classes.len(), root_dir);

    let mut set = ImageSet::empty(3, side, side);
    for (label, class_name) in classes.iter().enumerate() {
        let class_dir = root_dir.join(class_name);

        let mut files: Vec<PathBuf> = WalkDir::new(&class_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| is_image(p))
            .collect();
        files.sort();

        for file in &files {
            set.push(&load_chw(file, side)?, label)?;
        }
        debug!("Class '{}' (label {}): {} images", class_name, label, files.len());
    }

    info!("Loaded {} images", set.len());
    Ok(set)
}
