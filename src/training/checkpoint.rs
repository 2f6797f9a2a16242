//! Checkpoint persistence
//!
//! One primary artifact per (architecture, dataset, bit-width), overwritten
//! every epoch, plus a "best" copy refreshed whenever the evaluation score
//! improves. Each artifact is a Burn model record next to a JSON sidecar with
//! the epoch's schedule and scores.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::config::HashTrainingConfig;
use crate::training::schedule::EpochSchedule;
use crate::utils::error::{HashError, Result};

/// Score below any real mAP
pub const INITIAL_BEST: f64 = -99999.0;

/// File extension `CompactRecorder` writes
const RECORD_EXTENSION: &str = "mpk";

/// Metadata stored next to every model record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Zero-based epoch the record was written after
    pub completed_epoch: usize,
    /// Epoch a resumed run starts from
    pub next_epoch: usize,
    pub arch: String,
    pub dataset: String,
    pub num_bits: usize,
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub consistency_weight: f64,
    pub map: Option<f64>,
    pub best_map: f64,
    pub is_best: bool,
    pub saved_at: String,
}

impl CheckpointState {
    pub fn new(
        config: &HashTrainingConfig,
        schedule: &EpochSchedule,
        map: Option<f64>,
        best_map: f64,
        is_best: bool,
    ) -> Self {
        Self {
            completed_epoch: schedule.epoch,
            next_epoch: schedule.epoch + 1,
            arch: config.arch.clone(),
            dataset: config.dataset.clone(),
            num_bits: config.num_bits,
            learning_rate: schedule.learning_rate,
            beta_1: schedule.beta_1,
            beta_2: schedule.beta_2,
            consistency_weight: schedule.consistency_weight,
            map,
            best_map,
            is_best,
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Tracks the best evaluation score seen so far
#[derive(Debug, Clone, Copy)]
pub struct BestTracker {
    best: f64,
}

impl Default for BestTracker {
    fn default() -> Self {
        Self { best: INITIAL_BEST }
    }
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    /// Record `score`; true when it strictly beats every earlier score
    pub fn observe(&mut self, score: f64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}

/// Where and how checkpoints are written
pub trait CheckpointStore<B: Backend, M: Module<B>> {
    fn save(&self, model: &M, state: &CheckpointState) -> Result<()>;
}

/// Checkpoints on the local filesystem
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
    stem: String,
    best_stem: String,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, best_stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            best_stem: best_stem.into(),
        }
    }

    /// `{arch}_{dataset}_{bits}bits` and `{arch}_model_best_{dataset}_{bits}` under the checkpoint dir
    pub fn from_config(config: &HashTrainingConfig) -> Self {
        Self::new(
            &config.checkpoint_dir,
            config.checkpoint_stem(),
            format!("{}_model_best_{}_{}", config.arch, config.dataset, config.num_bits),
        )
    }

    fn base(&self, best: bool) -> PathBuf {
        self.dir.join(if best { &self.best_stem } else { &self.stem })
    }

    /// Path of the model record
    pub fn model_path(&self, best: bool) -> PathBuf {
        self.base(best).with_extension(RECORD_EXTENSION)
    }

    /// Path of the JSON sidecar
    pub fn state_path(&self, best: bool) -> PathBuf {
        self.base(best).with_extension("json")
    }

    pub fn load_state(&self, best: bool) -> Result<CheckpointState> {
        let path = self.state_path(best);
        if !path.exists() {
            return Err(HashError::PathNotFound(path));
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load saved parameters into `model`
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, best: bool, device: &B::Device) -> Result<M> {
        let path = self.model_path(best);
        if !path.exists() {
            return Err(HashError::PathNotFound(path));
        }
        model
            .load_file(self.base(best), &CompactRecorder::new(), device)
            .map_err(|e| HashError::Checkpoint(format!("failed to load {:?}: {:?}", path, e)))
    }

    fn copy_to_best(&self) -> Result<()> {
        std::fs::copy(self.model_path(false), self.model_path(true))?;
        std::fs::copy(self.state_path(false), self.state_path(true))?;
        Ok(())
    }
}

impl<B: Backend, M: Module<B>> CheckpointStore<B, M> for FileCheckpointStore {
    fn save(&self, model: &M, state: &CheckpointState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        model
            .clone()
            .save_file(self.base(false), &CompactRecorder::new())
            .map_err(|e| HashError::Checkpoint(format!("failed to save model: {:?}", e)))?;

        std::fs::write(self.state_path(false), serde_json::to_string_pretty(state)?)?;
        debug!("Checkpoint written to {:?}", self.model_path(false));

        if state.is_best {
            self.copy_to_best()?;
            info!("Best checkpoint updated (epoch {})", state.completed_epoch);
        }
        Ok(())
    }
}

/// Whether a checkpoint record exists at `path`
pub fn checkpoint_exists(path: &Path) -> bool {
    path.with_extension(RECORD_EXTENSION).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cnn::HashNetConfig;
    use crate::model::HashNet;
    use crate::training::schedule::RampSchedule;
    use burn_ndarray::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_best_tracker_strictly_increasing() {
        let mut tracker = BestTracker::new();
        let scores = [0.1, 0.3, 0.3, 0.2, 0.5];
        let flags: Vec<bool> = scores.iter().map(|&s| tracker.observe(s)).collect();
        assert_eq!(flags, vec![true, true, false, false, true]);
        assert_eq!(tracker.best(), 0.5);
    }

    #[test]
    fn test_first_score_always_best() {
        let mut tracker = BestTracker::new();
        assert!(tracker.observe(-10.0));
    }

    #[test]
    fn test_file_names() {
        let config = HashTrainingConfig {
            checkpoint_dir: PathBuf::from("/tmp/ckpt"),
            num_bits: 12,
            ..Default::default()
        };
        let store = FileCheckpointStore::from_config(&config);
        assert_eq!(store.model_path(false), PathBuf::from("/tmp/ckpt/cnn_cifar10_12bits.mpk"));
        assert_eq!(
            store.state_path(true),
            PathBuf::from("/tmp/ckpt/cnn_model_best_cifar10_12.json")
        );
    }

    #[test]
    fn test_save_and_best_copy() {
        let dir = TempDir::new().unwrap();
        let config = HashTrainingConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            num_bits: 8,
            ..Default::default()
        };
        let store = FileCheckpointStore::from_config(&config);
        let device = Default::default();
        let model: HashNet<TestBackend> = HashNetConfig::new()
            .with_num_bits(8)
            .with_num_blocks(1)
            .with_base_filters(4)
            .with_hidden_units(8)
            .init(&device);
        let schedule = RampSchedule::new(4, 2, 2, 1e-3);

        let state = CheckpointState::new(&config, &schedule.at(0), Some(0.2), 0.2, true);
        CheckpointStore::<TestBackend, _>::save(&store, &model, &state).unwrap();
        assert!(checkpoint_exists(&store.model_path(true)));
        let best = store.load_state(true).unwrap();
        assert_eq!(best.completed_epoch, 0);
        assert_eq!(best.next_epoch, 1);

        let state = CheckpointState::new(&config, &schedule.at(1), Some(0.1), 0.2, false);
        CheckpointStore::<TestBackend, _>::save(&store, &model, &state).unwrap();
        assert_eq!(store.load_state(false).unwrap().next_epoch, 2);
        assert_eq!(store.load_state(true).unwrap().completed_epoch, 0);

        let reloaded = store.load_model(model, true, &device);
        assert!(reloaded.is_ok());
    }
}
