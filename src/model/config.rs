//! Training Configuration Module
//!
//! Every tunable of a hashing run lives in [`HashTrainingConfig`]. The struct is
//! serde-serializable so runs can be driven from a JSON file, and it validates
//! itself before any epoch starts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{HashError, Result};

/// When the anchor ensemble folds its current embeddings into the running average
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AnchorFold {
    /// Fold once after the last step of every epoch, like the main store
    #[default]
    PerEpoch,
    /// Fold after every optimizer step inside the epoch
    PerStep,
}

/// Configuration for a semi-supervised hashing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashTrainingConfig {
    /// Dataset name, used in checkpoint file names
    pub dataset: String,
    /// Architecture tag, used as checkpoint prefix
    pub arch: String,

    /// Number of training epochs
    pub epochs: usize,
    /// Indices per training step (labeled + unlabeled)
    pub batch_size: usize,
    /// Labeled indices per training step
    pub labeled_per_batch: usize,

    /// Size of the fixed anchor set drawn from the labeled pool
    pub anchor_count: usize,
    /// Anchors re-sampled for every step
    pub anchor_subsample: usize,

    /// Hash code length
    pub num_bits: usize,
    /// Code length the similarity scale was tuned for
    pub reference_bits: usize,
    /// Number of label classes
    pub num_classes: usize,

    /// Training samples whose labels are kept (class-balanced)
    pub labeled_total: usize,
    /// Samples per class held out as retrieval queries (0 disables evaluation)
    pub query_per_class: usize,

    /// Peak learning rate, modulated by ramp-up and ramp-down
    pub base_lr: f64,
    /// Epochs of consistency/learning-rate ramp-up
    pub rampup_length: usize,
    /// Final epochs of learning-rate/momentum ramp-down
    pub rampdown_length: usize,

    /// Decay of the per-sample temporal ensemble
    pub ensemble_decay: f64,
    /// Decay of the anchor temporal ensemble
    pub anchor_decay: f64,
    /// Anchor ensemble fold cadence
    #[serde(default)]
    pub anchor_fold: AnchorFold,

    /// Multiplier applied to the ramped consistency weight
    pub consistency_scale: f64,
    /// Scale applied to the code inner product before the logistic
    pub similarity_scale: f64,
    /// Weight of the labeled x labeled pairwise term
    pub gamma: f64,

    /// Evaluate every N epochs
    pub eval_interval: usize,
    /// Only rank the top-k gallery items when computing mAP (None = all)
    pub map_top_k: Option<usize>,

    /// Directory for model checkpoints
    pub checkpoint_dir: PathBuf,
    /// Directory for run logs and summaries
    pub log_dir: PathBuf,

    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for HashTrainingConfig {
    fn default() -> Self {
        Self {
            dataset: "cifar10".to_string(),
            arch: "cnn".to_string(),
            epochs: 100,
            batch_size: 100,
            labeled_per_batch: 40,
            anchor_count: 500,
            anchor_subsample: 100,
            num_bits: 48,
            reference_bits: 48,
            num_classes: 10,
            labeled_total: 5000,
            query_per_class: 1000,
            base_lr: 5e-5,
            rampup_length: 40,
            rampdown_length: 40,
            ensemble_decay: 0.4,
            anchor_decay: 0.99,
            anchor_fold: AnchorFold::PerEpoch,
            consistency_scale: 20.0,
            similarity_scale: 0.4,
            gamma: 0.1,
            eval_interval: 1,
            map_top_k: None,
            checkpoint_dir: PathBuf::from("./checkpoint"),
            log_dir: PathBuf::from("./log"),
            seed: 123,
        }
    }
}

impl HashTrainingConfig {
    /// Unlabeled indices per training step
    pub fn unlabeled_per_batch(&self) -> usize {
        self.batch_size.saturating_sub(self.labeled_per_batch)
    }

    /// Anchors actually drawn per step (never more than the anchor set holds)
    pub fn effective_anchor_subsample(&self) -> usize {
        self.anchor_subsample.min(self.anchor_count)
    }

    /// Multiplier turning code inner products into similarity logits
    pub fn logit_scale(&self) -> f64 {
        self.reference_bits as f64 / self.num_bits as f64 * self.similarity_scale
    }

    /// Base name of the primary checkpoint artifact
    pub fn checkpoint_stem(&self) -> String {
        format!("{}_{}_{}bits", self.arch, self.dataset, self.num_bits)
    }

    /// Validate every data-independent setting
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(config_err("epochs must be greater than 0"));
        }

        if self.batch_size == 0 {
            return Err(config_err("batch_size must be greater than 0"));
        }

        if self.labeled_per_batch == 0 || self.labeled_per_batch >= self.batch_size {
            return Err(HashError::Config(format!(
                "labeled_per_batch must be in [1, batch_size) (got {} with batch_size {})",
                self.labeled_per_batch, self.batch_size
            )));
        }

        if self.num_bits == 0 || self.reference_bits == 0 {
            return Err(config_err("num_bits and reference_bits must be greater than 0"));
        }

        if self.num_classes == 0 {
            return Err(config_err("num_classes must be greater than 0"));
        }

        if self.labeled_total == 0 {
            return Err(config_err("labeled_total must be greater than 0"));
        }

        if self.anchor_count == 0 || self.anchor_subsample == 0 {
            return Err(config_err(
                "anchor_count and anchor_subsample must be greater than 0",
            ));
        }

        if !(0.0..1.0).contains(&self.ensemble_decay) || !(0.0..1.0).contains(&self.anchor_decay)
        {
            return Err(config_err("ensemble decays must be in range [0.0, 1.0)"));
        }

        if !self.base_lr.is_finite() || self.base_lr <= 0.0 {
            return Err(config_err("base_lr must be a positive finite number"));
        }

        if !self.consistency_scale.is_finite()
            || !self.similarity_scale.is_finite()
            || !self.gamma.is_finite()
        {
            return Err(config_err("loss scales must be finite"));
        }

        if self.eval_interval == 0 {
            return Err(config_err("eval_interval must be greater than 0"));
        }

        if self.map_top_k == Some(0) {
            return Err(config_err("map_top_k must be greater than 0 when set"));
        }

        Ok(())
    }

    /// Validate the settings that depend on the label partition
    pub fn check_partition(&self, labeled: usize, unlabeled: usize) -> Result<()> {
        if self.anchor_count > labeled {
            return Err(HashError::Config(format!(
                "anchor_count {} exceeds the labeled pool of {}",
                self.anchor_count, labeled
            )));
        }

        if labeled < self.labeled_per_batch {
            return Err(HashError::Config(format!(
                "labeled pool of {} cannot fill {} labeled slots per batch",
                labeled, self.labeled_per_batch
            )));
        }

        if unlabeled < self.unlabeled_per_batch() {
            return Err(HashError::Config(format!(
                "unlabeled pool of {} cannot fill {} unlabeled slots per batch",
                unlabeled,
                self.unlabeled_per_batch()
            )));
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HashError::PathNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn config_err(msg: &str) -> HashError {
    HashError::Config(msg.to_string())
}
