//! # Anchor Hash
//!
//! Semi-supervised deep hashing with the Burn framework. A small labeled subset
//! and a larger unlabeled subset jointly train a network whose `tanh` outputs
//! binarise into compact hash codes for image retrieval.
//!
//! ## Features
//!
//! - **Anchor similarity**: every batch is compared against a fixed labeled anchor set
//! - **Temporal ensembling**: per-sample running averages of embeddings act as consistency targets
//! - **Ramp schedules** for learning rate, Adam betas and the consistency weight
//! - **Hamming-ranking mAP** evaluation with best-checkpoint tracking
//!
//! ## Modules
//!
//! - `dataset`: Loaders, label/anchor splits, two-stream sampling, Burn batching
//! - `model`: Hashing CNN and run configuration
//! - `training`: Schedules, similarity targets, ensembles, loss, checkpoints, trainer
//! - `evaluation`: Binary codes and mean Average Precision
//! - `utils`: Errors, logging, metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use anchor_hash::backend::{default_device, TrainingBackend};
//! use anchor_hash::dataset::synthetic::{generate, SyntheticConfig};
//! use anchor_hash::model::{HashNetConfig, HashTrainingConfig};
//! use anchor_hash::training::{prepare_data, Trainer};
//!
//! let config = HashTrainingConfig::default();
//! let images = generate(&SyntheticConfig::default())?;
//! let data = prepare_data(&images, &config)?;
//! let model = HashNetConfig::new().init::<TrainingBackend>(&default_device());
//! let mut trainer = Trainer::new(model, config, data.train, data.partition, data.anchor_idx, default_device())?;
//! let summary = trainer.fit()?;
//! ```

pub mod backend;
pub mod dataset;
pub mod evaluation;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::{HashBatch, HashBatcher, HashDataset, HashItem, ImageSet, TwoStreamSampler};
pub use evaluation::{mean_average_precision, Evaluator, HammingMapEvaluator};
pub use model::{AnchorFold, FeatureExtractor, HashNet, HashNetConfig, HashTrainingConfig};
pub use training::{prepare_data, FileCheckpointStore, Trainer, TrainingSummary};
pub use utils::error::{HashError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
