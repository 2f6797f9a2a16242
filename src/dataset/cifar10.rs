//! CIFAR-10 binary format reader
//!
//! CIFAR-10 ships as five training batches and one test batch of 10,000
//! records each. Every record is one label byte followed by 3072 pixel bytes
//! stored planar (R...R, G...G, B...B), which is already CHW order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use super::image_set::ImageSet;
use crate::utils::error::{HashError, Result};

/// CIFAR-10 class names
pub const CLASS_NAMES: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

const SIDE: usize = 32;
const IMAGE_BYTES: usize = 3 * SIDE * SIDE;
const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

/// Parse the records of one batch file held in memory
pub fn parse_records(buffer: &[u8]) -> Result<ImageSet> {
    if buffer.is_empty() || buffer.len() % RECORD_BYTES != 0 {
        return Err(HashError::Dataset(format!(
            "CIFAR-10 buffer of {} bytes is not a whole number of {}-byte records",
            buffer.len(),
            RECORD_BYTES
        )));
    }

    let mut set = ImageSet::empty(3, SIDE, SIDE);
    for record in buffer.chunks_exact(RECORD_BYTES) {
        let label = record[0] as usize;
        if label >= CLASS_NAMES.len() {
            return Err(HashError::Dataset(format!("invalid CIFAR-10 label {}", label)));
        }
        set.push(&record[1..], label)?;
    }

    Ok(set)
}

fn read_batch(path: &Path) -> Result<ImageSet> {
    if !path.exists() {
        return Err(HashError::PathNotFound(path.to_path_buf()));
    }

    let mut buffer = Vec::new();
    File::open(path)?.read_to_end(&mut buffer)?;
    parse_records(&buffer)
}

/// Load every batch file (training batches first, then the test batch) into one set.
///
/// The official split is ignored on purpose: retrieval experiments draw their
/// own query set per class from the pooled data.
pub fn load_all(data_dir: &Path) -> Result<ImageSet> {
    let mut files: Vec<_> = (1..=5)
        .map(|i| data_dir.join(format!("data_batch_{}.bin", i)))
        .collect();
    files.push(data_dir.join("test_batch.bin"));

    let mut all = ImageSet::empty(3, SIDE, SIDE);
    for file in &files {
        let batch = read_batch(file)?;
        for idx in 0..batch.len() {
            if let (Some(image), Some(label)) = (batch.image(idx), batch.label(idx)) {
                all.push(image, label)?;
            }
        }
        info!("Loaded {} records from {:?}", batch.len(), file);
    }

    Ok(all)
}
