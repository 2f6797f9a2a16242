//! Training module for semi-supervised hashing
//!
//! This module provides:
//! - Ramp-up/ramp-down schedules for learning rate, Adam betas and consistency weight
//! - Pairwise similarity targets from labels
//! - Temporal ensembling stores for samples and anchors
//! - The pairwise + consistency hashing loss
//! - Checkpointing with best-model tracking
//! - The epoch/step training loop
//!
//! ## Approach
//!
//! Labeled samples shape the code space through their similarity to a fixed
//! anchor set; unlabeled samples contribute through consistency with their own
//! exponentially averaged embeddings from earlier epochs (temporal ensembling).

pub mod anchors;
pub mod checkpoint;
pub mod ensemble;
pub mod loss;
pub mod schedule;
pub mod similarity;
pub mod trainer;

pub use anchors::{AnchorDraw, AnchorManager};
pub use checkpoint::{BestTracker, CheckpointState, CheckpointStore, FileCheckpointStore};
pub use ensemble::TemporalEnsemble;
pub use loss::{HashLoss, LossInputs, LossOutput};
pub use schedule::{rampdown, rampup, step_rampup, EpochSchedule, RampSchedule};
pub use similarity::{build_similarity, one_hot, SimilarityPair};
pub use trainer::{prepare_data, EpochReport, RunData, StepOutcome, Trainer, TrainingSummary};
