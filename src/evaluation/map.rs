//! Hamming-ranking mean Average Precision
//!
//! Gallery items are ranked for every query by Hamming distance between binary
//! codes (ties keep gallery order). Average precision for a query is the mean
//! of the precision values at each relevant hit in the (optionally truncated)
//! ranking; a query with no relevant hit scores 0.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use tracing::debug;

use crate::dataset::{HashBatch, HashBatcher, HashDataset};
use crate::model::FeatureExtractor;
use crate::utils::error::{HashError, Result};

/// Binary codes packed one bit per byte, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCodes {
    bits: usize,
    codes: Vec<u8>,
}

impl BinaryCodes {
    /// Binarise row-major real embeddings by sign (`>= 0` maps to 1)
    pub fn from_embeddings(values: &[f32], bits: usize) -> Result<Self> {
        if bits == 0 || values.len() % bits != 0 {
            return Err(HashError::Shape(format!(
                "{} values do not form rows of {} bits",
                values.len(),
                bits
            )));
        }
        Ok(Self {
            bits,
            codes: values.iter().map(|&v| u8::from(v >= 0.0)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len() / self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.codes[i * self.bits..(i + 1) * self.bits]
    }

    fn extend(&mut self, other: BinaryCodes) {
        self.codes.extend(other.codes);
    }
}

pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Average precision of a single ranked relevance list
fn average_precision(relevant: impl Iterator<Item = bool>) -> f64 {
    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (rank, is_relevant) in relevant.enumerate() {
        if is_relevant {
            hits += 1;
            precision_sum += hits as f64 / (rank + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        precision_sum / hits as f64
    }
}

/// mAP of `query` codes retrieving from `gallery` codes
pub fn mean_average_precision(
    query: &BinaryCodes,
    query_labels: &[usize],
    gallery: &BinaryCodes,
    gallery_labels: &[usize],
    top_k: Option<usize>,
) -> Result<f64> {
    if query.bits() != gallery.bits() {
        return Err(HashError::Shape(format!(
            "query codes have {} bits, gallery codes {}",
            query.bits(),
            gallery.bits()
        )));
    }
    if query.len() != query_labels.len() || gallery.len() != gallery_labels.len() {
        return Err(HashError::Shape("codes and labels differ in length".to_string()));
    }
    if query.is_empty() {
        return Ok(0.0);
    }

    let depth = top_k.unwrap_or(gallery.len()).min(gallery.len());
    let mut total = 0.0;

    for q in 0..query.len() {
        let code = query.row(q);
        let mut ranking: Vec<(usize, usize)> = (0..gallery.len())
            .map(|g| (hamming_distance(code, gallery.row(g)), g))
            .collect();
        ranking.sort_by_key(|&(dist, _)| dist);

        let label = query_labels[q];
        total += average_precision(
            ranking
                .iter()
                .take(depth)
                .map(|&(_, g)| gallery_labels[g] == label),
        );
    }

    Ok(total / query.len() as f64)
}

/// Binary codes for every item of `dataset`, in index order
pub fn encode<B: Backend, M: FeatureExtractor<B>>(
    model: &M,
    dataset: &HashDataset,
    batcher: &HashBatcher,
    batch_size: usize,
    device: &B::Device,
) -> Result<BinaryCodes> {
    let bits = model.num_bits();
    let mut codes = BinaryCodes {
        bits,
        codes: Vec::with_capacity(dataset.len() * bits),
    };

    let len = dataset.len();
    for start in (0..len).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let batch: HashBatch<B> = batcher.batch(items, device);
        let values: Vec<f32> = model
            .embed(batch.images)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| HashError::Shape(format!("cannot read embeddings: {:?}", e)))?;
        codes.extend(BinaryCodes::from_embeddings(&values, bits)?);
    }

    Ok(codes)
}

/// Scores an inference model with a single comparable number, higher is better
pub trait Evaluator<M> {
    fn evaluate(&self, model: &M) -> Result<f64>;
}

/// mAP of a query set retrieving from a gallery set
#[derive(Debug, Clone)]
pub struct HammingMapEvaluator<B: Backend> {
    query: HashDataset,
    gallery: HashDataset,
    batcher: HashBatcher,
    batch_size: usize,
    top_k: Option<usize>,
    device: B::Device,
}

impl<B: Backend> HammingMapEvaluator<B> {
    pub fn new(
        query: HashDataset,
        gallery: HashDataset,
        batcher: HashBatcher,
        batch_size: usize,
        top_k: Option<usize>,
        device: B::Device,
    ) -> Self {
        Self {
            query,
            gallery,
            batcher,
            batch_size,
            top_k,
            device,
        }
    }
}

impl<B: Backend, M: FeatureExtractor<B>> Evaluator<M> for HammingMapEvaluator<B> {
    fn evaluate(&self, model: &M) -> Result<f64> {
        let gallery = encode(model, &self.gallery, &self.batcher, self.batch_size, &self.device)?;
        let query = encode(model, &self.query, &self.batcher, self.batch_size, &self.device)?;
        debug!(
            "Encoded {} queries against {} gallery items",
            query.len(),
            gallery.len()
        );
        mean_average_precision(
            &query,
            self.query.labels(),
            &gallery,
            self.gallery.labels(),
            self.top_k,
        )
    }
}
