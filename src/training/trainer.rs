//! Semi-supervised hashing trainer
//!
//! Drives the epoch state machine:
//!
//! ```text
//! BeginEpoch -> Schedule -> RebuildOptimizer -> RefreshAnchors -> Step* ->
//! FoldEnsemble -> Evaluate? -> Checkpoint -> EndEpoch
//! ```
//!
//! Every step forwards a two-stream batch and an anchor sub-batch through the
//! same network, scores them with [`HashLoss`], applies one Adam update and
//! commits the fresh embeddings into the temporal ensembles. Ensembles fold at
//! the end of the epoch, so targets read during an epoch are one epoch stale.

use std::path::Path;
use std::time::Instant;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::anchors::AnchorManager;
use super::checkpoint::{BestTracker, CheckpointState, CheckpointStore};
use super::ensemble::TemporalEnsemble;
use super::loss::{HashLoss, LossInputs};
use super::schedule::{EpochSchedule, RampSchedule};
use super::similarity::build_similarity;
use crate::dataset::{
    holdout_split, select_anchors, split_labeled, Augmentation, HashBatch, HashBatcher,
    HashDataset, HashItem, ImageSet, LabelPartition, Normalization, StepBatch, TwoStreamSampler,
};
use crate::evaluation::Evaluator;
use crate::model::config::{AnchorFold, HashTrainingConfig};
use crate::model::FeatureExtractor;
use crate::utils::error::{HashError, Result};
use crate::utils::logging::TrainingLogger;
use crate::utils::metrics::AverageMeter;

/// Losses of one optimizer step
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: usize,
    pub total: f64,
    pub pairwise: f64,
    pub consistency: f64,
}

/// Summary of one epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochReport {
    pub schedule: EpochSchedule,
    pub steps: Vec<StepOutcome>,
    pub skipped_steps: usize,
    pub mean_total: f64,
    pub mean_pairwise: f64,
    pub mean_consistency: f64,
    pub map: Option<f64>,
    pub is_best: bool,
    pub data_time: f64,
    pub batch_time: f64,
    pub elapsed_secs: f64,
}

/// Result of [`Trainer::fit`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochReport>,
    pub best_map: Option<f64>,
}

impl TrainingSummary {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Training data of a run after splitting
#[derive(Debug, Clone)]
pub struct RunData {
    pub train: HashDataset,
    /// Held-out queries; `None` when evaluation is disabled
    pub query: Option<HashDataset>,
    pub partition: LabelPartition,
    pub anchor_idx: Vec<usize>,
}

/// Hold out queries, split labeled/unlabeled and choose anchors
pub fn prepare_data(images: &ImageSet, config: &HashTrainingConfig) -> Result<RunData> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let (train, query) = if config.query_per_class > 0 {
        let holdout = holdout_split(images.labels(), config.query_per_class, &mut rng)?;
        (
            images.subset(&holdout.train_idx)?,
            Some(HashDataset::new(images.subset(&holdout.query_idx)?)),
        )
    } else {
        (images.clone(), None)
    };

    let partition = split_labeled(train.labels(), config.labeled_total, &mut rng)?;
    config.check_partition(partition.labeled_idx.len(), partition.unlabeled_idx.len())?;
    let anchor_idx = select_anchors(
        train.labels(),
        &partition.labeled_idx,
        config.anchor_count,
        &mut rng,
    )?;

    info!(
        "Prepared {} training samples ({} labeled, {} unlabeled, {} anchors), {} queries",
        train.len(),
        partition.labeled_idx.len(),
        partition.unlabeled_idx.len(),
        anchor_idx.len(),
        query.as_ref().map(|q| q.len()).unwrap_or(0)
    );

    Ok(RunData {
        train: HashDataset::new(train),
        query,
        partition,
        anchor_idx,
    })
}

/// Trainer for a [`FeatureExtractor`] under the semi-supervised hashing objective
pub struct Trainer<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + FeatureExtractor<B>,
{
    model: M,
    config: HashTrainingConfig,
    device: B::Device,
    dataset: HashDataset,
    batcher: HashBatcher,
    augmentation: Option<Augmentation>,
    partition: LabelPartition,
    sampler: TwoStreamSampler,
    anchors: AnchorManager,
    ensemble: TemporalEnsemble,
    schedule: RampSchedule,
    loss: HashLoss,
    best: BestTracker,
    evaluator: Option<Box<dyn Evaluator<M::InnerModule>>>,
    checkpoints: Option<Box<dyn CheckpointStore<B, M>>>,
    logger: TrainingLogger,
    rng: ChaCha8Rng,
}

impl<B, M> Trainer<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + FeatureExtractor<B>,
{
    pub fn new(
        model: M,
        config: HashTrainingConfig,
        dataset: HashDataset,
        partition: LabelPartition,
        anchor_idx: Vec<usize>,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;
        config.check_partition(partition.labeled_idx.len(), partition.unlabeled_idx.len())?;

        if partition.num_samples() != dataset.len() {
            return Err(HashError::InvalidInput(format!(
                "label mask covers {} samples, dataset has {}",
                partition.num_samples(),
                dataset.len()
            )));
        }
        if model.num_bits() != config.num_bits {
            return Err(HashError::Config(format!(
                "model produces {} bits, config expects {}",
                model.num_bits(),
                config.num_bits
            )));
        }
        if let Some(&idx) = anchor_idx.iter().find(|&&i| !partition.is_labeled(i)) {
            return Err(HashError::InvalidInput(format!(
                "anchor {} is not a labeled sample",
                idx
            )));
        }
        if let Some(&label) = dataset.labels().iter().find(|&&l| l >= config.num_classes) {
            return Err(HashError::Dataset(format!(
                "label {} out of range for {} classes",
                label, config.num_classes
            )));
        }

        let sampler = TwoStreamSampler::new(
            partition.unlabeled_idx.clone(),
            partition.labeled_idx.clone(),
            config.batch_size,
            config.labeled_per_batch,
        )?;
        let anchors = AnchorManager::new(
            anchor_idx,
            dataset.labels(),
            config.num_bits,
            config.anchor_decay,
            config.effective_anchor_subsample(),
        )?;
        let ensemble = TemporalEnsemble::new(dataset.len(), config.num_bits, config.ensemble_decay)?;

        let batcher = HashBatcher::for_images(
            dataset.images(),
            Normalization::for_channels(dataset.images().channels),
        );

        let schedule = RampSchedule::new(
            config.epochs,
            config.rampup_length,
            config.rampdown_length,
            config.base_lr,
        );
        let loss = HashLoss::new(config.num_bits, config.logit_scale(), config.gamma);

        info!(
            "Trainer ready: {} samples, {} steps/epoch, {} anchors ({} per step)",
            dataset.len(),
            sampler.steps_per_epoch(),
            anchors.len(),
            anchors.subsample()
        );

        Ok(Self {
            model,
            device,
            dataset,
            batcher,
            augmentation: Some(Augmentation::default()),
            partition,
            sampler,
            anchors,
            ensemble,
            schedule,
            loss,
            best: BestTracker::new(),
            evaluator: None,
            checkpoints: None,
            logger: TrainingLogger::new(config.epochs),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn with_evaluator<E>(mut self, evaluator: E) -> Self
    where
        E: Evaluator<M::InnerModule> + 'static,
    {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn with_checkpoints<S>(mut self, store: S) -> Self
    where
        S: CheckpointStore<B, M> + 'static,
    {
        self.checkpoints = Some(Box::new(store));
        self
    }

    /// Training-time augmentation (`None` feeds raw images)
    pub fn with_augmentation(mut self, augmentation: Option<Augmentation>) -> Self {
        self.augmentation = augmentation;
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.batcher = HashBatcher::for_images(self.dataset.images(), normalization);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn config(&self) -> &HashTrainingConfig {
        &self.config
    }

    pub fn ensemble(&self) -> &TemporalEnsemble {
        &self.ensemble
    }

    pub fn anchors(&self) -> &AnchorManager {
        &self.anchors
    }

    pub fn partition(&self) -> &LabelPartition {
        &self.partition
    }

    pub fn best_map(&self) -> Option<f64> {
        let best = self.best.best();
        (best > super::checkpoint::INITIAL_BEST).then_some(best)
    }

    /// Run every configured epoch
    pub fn fit(&mut self) -> Result<TrainingSummary> {
        let mut summary = TrainingSummary::default();

        for epoch in 0..self.config.epochs {
            let report = self.train_epoch(epoch)?;
            summary.epochs.push(report);
        }
        summary.best_map = self.best_map();
        self.logger.log_complete(summary.best_map);

        let summary_path = self
            .config
            .log_dir
            .join(format!("{}_summary.json", self.config.checkpoint_stem()));
        if let Err(e) = summary.save(&summary_path) {
            warn!("Failed to write training summary to {:?}: {}", summary_path, e);
        }

        Ok(summary)
    }

    /// Run one epoch of the state machine
    pub fn train_epoch(&mut self, epoch: usize) -> Result<EpochReport> {
        let schedule = self.schedule.at(epoch);
        let consistency_weight = schedule.consistency_weight * self.config.consistency_scale;
        self.logger
            .start_epoch(epoch, schedule.learning_rate, consistency_weight);

        let mut optimizer = AdamConfig::new()
            .with_beta_1(schedule.beta_1 as f32)
            .with_beta_2(schedule.beta_2 as f32)
            .with_epsilon(1e-8)
            .init::<B, M>();

        self.anchors
            .refresh(&self.dataset, self.augmentation.as_ref(), &mut self.rng)?;

        let mut data_time = AverageMeter::new();
        let mut batch_time = AverageMeter::new();
        let mut total = AverageMeter::new();
        let mut pairwise = AverageMeter::new();
        let mut consistency = AverageMeter::new();
        let mut steps = Vec::with_capacity(self.sampler.steps_per_epoch());
        let mut skipped_steps = 0;

        let batches: Vec<StepBatch> = self.sampler.epoch(&mut self.rng).collect();
        for (step, batch) in batches.into_iter().enumerate() {
            let tick = Instant::now();
            match self.train_step(
                &mut optimizer,
                step,
                &batch,
                &schedule,
                consistency_weight,
                &mut data_time,
            )? {
                Some(outcome) => {
                    total.update(outcome.total);
                    pairwise.update(outcome.pairwise);
                    consistency.update(outcome.consistency);
                    steps.push(outcome);
                }
                None => skipped_steps += 1,
            }

            batch_time.update(tick.elapsed().as_secs_f64());
        }

        self.ensemble.fold(epoch);
        if self.config.anchor_fold == AnchorFold::PerEpoch {
            self.anchors.fold(epoch);
        }

        let map = if self.should_evaluate(epoch) {
            self.evaluate()
        } else {
            None
        };
        let is_best = match map {
            Some(score) => self.best.observe(score),
            None => false,
        };
        if is_best {
            self.logger.log_new_best(self.best.best());
        }

        self.logger.end_epoch(
            steps.len(),
            (total.avg(), pairwise.avg(), consistency.avg()),
            map,
            schedule.learning_rate,
        );
        self.save_checkpoint(&schedule, map, is_best);

        Ok(EpochReport {
            schedule,
            steps,
            skipped_steps,
            mean_total: total.avg(),
            mean_pairwise: pairwise.avg(),
            mean_consistency: consistency.avg(),
            map,
            is_best,
            data_time: data_time.avg(),
            batch_time: batch_time.avg(),
            elapsed_secs: self.logger.epoch_elapsed(),
        })
    }

    fn should_evaluate(&self, epoch: usize) -> bool {
        self.evaluator.is_some()
            && (epoch % self.config.eval_interval == 0 || epoch + 1 == self.config.epochs)
    }

    fn evaluate(&self) -> Option<f64> {
        let evaluator = self.evaluator.as_ref()?;
        match evaluator.evaluate(&self.model.valid()) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!("Evaluation failed: {}", e);
                None
            }
        }
    }

    fn save_checkpoint(&self, schedule: &EpochSchedule, map: Option<f64>, is_best: bool) {
        let Some(store) = self.checkpoints.as_ref() else {
            return;
        };
        let state = CheckpointState::new(&self.config, schedule, map, self.best.best(), is_best);
        if let Err(e) = store.save(&self.model, &state) {
            warn!("Checkpoint for epoch {} not written: {}", schedule.epoch, e);
        }
    }

    fn load_items(&mut self, indices: &[usize]) -> Result<Vec<HashItem>> {
        indices
            .iter()
            .map(|&idx| {
                let item = match self.augmentation.as_ref() {
                    Some(aug) => self.dataset.get_augmented(idx, aug, &mut self.rng),
                    None => self.dataset.get(idx),
                };
                item.ok_or_else(|| HashError::Dataset(format!("index {} missing from dataset", idx)))
            })
            .collect()
    }

    /// One optimizer step; `None` when the batch is short and the step is skipped.
    ///
    /// Image loading, augmentation and batching time goes into `data_time`.
    fn train_step<O: Optimizer<M, B>>(
        &mut self,
        optimizer: &mut O,
        step: usize,
        batch: &StepBatch,
        schedule: &EpochSchedule,
        consistency_weight: f64,
        data_time: &mut AverageMeter,
    ) -> Result<Option<StepOutcome>> {
        if batch.labeled.len() != self.sampler.labeled_per_batch()
            || batch.unlabeled.len() != self.sampler.unlabeled_per_batch()
        {
            debug!("Skipping short batch of {} at step {}", batch.len(), step);
            return Ok(None);
        }

        let load_start = Instant::now();
        let indices = batch.indices();
        let items = self.load_items(&indices)?;
        let draw = self.anchors.draw(&mut self.rng)?;

        let (labeled_rows, unlabeled_rows): (Vec<usize>, Vec<usize>) =
            (0..indices.len()).partition(|&row| self.partition.is_labeled(indices[row]));
        let labeled_labels: Vec<usize> = labeled_rows.iter().map(|&row| items[row].label).collect();

        let anchor_pair = build_similarity(&labeled_labels, &draw.labels, self.config.num_classes)?;
        let labeled_pair =
            build_similarity(&labeled_labels, &labeled_labels, self.config.num_classes)?;
        let (anchor_similarity, _) = anchor_pair.to_tensors::<B>(&self.device);
        let (_, labeled_weight) = labeled_pair.to_tensors::<B>(&self.device);

        let main: HashBatch<B> = self.batcher.batch(items, &self.device);
        let anchor_batch: HashBatch<B> = self.batcher.batch(draw.items, &self.device);
        data_time.update(load_start.elapsed().as_secs_f64());

        let h1 = self.model.embed(main.images);
        let h2 = self.model.embed(anchor_batch.images);
        let z1 = self.ensemble.targets_tensor::<B>(&indices, &self.device)?;
        let z2 = self.anchors.targets::<B>(&draw.positions, &self.device)?;

        let output = self.loss.forward(LossInputs {
            batch: h1.clone(),
            anchors: h2.clone(),
            batch_targets: z1,
            anchor_targets: z2,
            anchor_similarity,
            labeled_weight,
            labeled_rows,
            unlabeled_rows,
            consistency_weight,
        });

        let (total, pairwise, consistency) = output.values();
        if !total.is_finite() {
            return Err(HashError::Training(format!(
                "non-finite loss {} at epoch {} step {}",
                total, schedule.epoch, step
            )));
        }

        self.ensemble.commit(&indices, h1.detach())?;
        self.anchors.commit(&draw.positions, h2.detach())?;

        let grads = output.total.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = optimizer.step(schedule.learning_rate, self.model.clone(), grads);

        if self.config.anchor_fold == AnchorFold::PerStep {
            self.anchors.fold(schedule.epoch);
        }

        Ok(Some(StepOutcome {
            step,
            total,
            pairwise,
            consistency,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::{generate, SyntheticConfig};
    use crate::model::{HashNet, HashNetConfig};
    use burn::backend::Autodiff;
    use burn::module::Module;
    use burn::tensor::backend::Backend;
    use burn_ndarray::NdArray;
    use tempfile::TempDir;

    type TestBackend = Autodiff<NdArray>;

    /// Store whose every write fails
    struct FailingStore;

    impl<B: Backend, M: Module<B>> CheckpointStore<B, M> for FailingStore {
        fn save(&self, _model: &M, _state: &CheckpointState) -> Result<()> {
            Err(HashError::Checkpoint("disk full".to_string()))
        }
    }

    struct FailingEvaluator;

    impl<M> Evaluator<M> for FailingEvaluator {
        fn evaluate(&self, _model: &M) -> Result<f64> {
            Err(HashError::Dataset("gallery unavailable".to_string()))
        }
    }

    fn tiny_config() -> HashTrainingConfig {
        HashTrainingConfig {
            dataset: "synthetic".to_string(),
            epochs: 1,
            batch_size: 10,
            labeled_per_batch: 4,
            anchor_count: 10,
            anchor_subsample: 5,
            num_bits: 8,
            labeled_total: 20,
            query_per_class: 2,
            rampup_length: 1,
            rampdown_length: 1,
            base_lr: 1e-3,
            checkpoint_dir: std::env::temp_dir().join("anchor_hash_unit_ckpt"),
            log_dir: std::env::temp_dir().join("anchor_hash_unit_log"),
            ..Default::default()
        }
    }

    fn tiny_model() -> HashNet<TestBackend> {
        HashNetConfig::new()
            .with_num_bits(8)
            .with_num_blocks(1)
            .with_base_filters(4)
            .with_hidden_units(8)
            .init(&Default::default())
    }

    fn images() -> ImageSet {
        generate(&SyntheticConfig {
            samples: 80,
            side: 4,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_prepare_data_splits() {
        let config = tiny_config();
        let data = prepare_data(&images(), &config).unwrap();

        assert_eq!(data.query.as_ref().unwrap().len(), 20);
        assert_eq!(data.train.len(), 60);
        assert_eq!(data.partition.labeled_idx.len(), 20);
        assert_eq!(data.anchor_idx.len(), 10);
        assert!(data.anchor_idx.iter().all(|&i| data.partition.is_labeled(i)));
    }

    #[test]
    fn test_rejects_bit_mismatch() {
        let config = HashTrainingConfig {
            num_bits: 16,
            ..tiny_config()
        };
        let data = prepare_data(&images(), &tiny_config()).unwrap();
        let result = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        );
        assert!(matches!(result, Err(HashError::Config(_))));
    }

    #[test]
    fn test_rejects_unlabeled_anchor() {
        let config = tiny_config();
        let data = prepare_data(&images(), &config).unwrap();
        let mut anchors = data.anchor_idx.clone();
        anchors[0] = data.partition.unlabeled_idx[0];

        let result = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            anchors,
            Default::default(),
        );
        assert!(matches!(result, Err(HashError::InvalidInput(_))));
    }

    #[test]
    fn test_single_epoch_runs() {
        let config = tiny_config();
        let data = prepare_data(&images(), &config).unwrap();
        let mut trainer = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        )
        .unwrap();

        let report = trainer.train_epoch(0).unwrap();
        // 40 unlabeled / 6 and 20 labeled / 4 -> 5 steps
        assert_eq!(report.steps.len(), 5);
        assert_eq!(report.skipped_steps, 0);
        assert!(report.steps.iter().all(|s| s.total.is_finite()));
        assert!(report.map.is_none());
        assert_eq!(trainer.ensemble().folds(), 1);
        assert_eq!(trainer.anchors().store().folds(), 1);
    }

    #[test]
    fn test_per_step_anchor_fold() {
        let config = HashTrainingConfig {
            anchor_fold: AnchorFold::PerStep,
            ..tiny_config()
        };
        let data = prepare_data(&images(), &config).unwrap();
        let mut trainer = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        )
        .unwrap()
        .with_augmentation(None);

        let report = trainer.train_epoch(0).unwrap();
        assert_eq!(trainer.anchors().store().folds(), report.steps.len());
        assert_eq!(trainer.ensemble().folds(), 1);
    }

    #[test]
    fn test_data_time_covers_loading() {
        let config = tiny_config();
        let data = prepare_data(&images(), &config).unwrap();
        let mut trainer = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        )
        .unwrap();

        let report = trainer.train_epoch(0).unwrap();
        assert!(report.data_time > 0.0);
        assert!(report.data_time <= report.batch_time);
    }

    #[test]
    fn test_short_batch_is_skipped() {
        let config = tiny_config();
        let data = prepare_data(&images(), &config).unwrap();
        let unlabeled = data.partition.unlabeled_idx.clone();
        let labeled = data.partition.labeled_idx.clone();
        let mut trainer = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        )
        .unwrap();

        let schedule = trainer.schedule.at(0);
        let mut optimizer = AdamConfig::new().init::<TestBackend, HashNet<TestBackend>>();
        let mut data_time = AverageMeter::new();

        // one labeled index short, then one unlabeled index short
        let short = [
            StepBatch {
                unlabeled: unlabeled[..6].to_vec(),
                labeled: labeled[..3].to_vec(),
            },
            StepBatch {
                unlabeled: unlabeled[..5].to_vec(),
                labeled: labeled[..4].to_vec(),
            },
        ];
        for batch in &short {
            let outcome = trainer
                .train_step(&mut optimizer, 0, batch, &schedule, 0.0, &mut data_time)
                .unwrap();
            assert!(outcome.is_none());
        }

        assert_eq!(trainer.ensemble().touched_count(), 0);
        assert_eq!(trainer.anchors().store().touched_count(), 0);
        assert_eq!(data_time.count, 0);
    }

    #[test]
    fn test_failed_checkpoint_and_evaluation_do_not_stop_training() {
        let dir = TempDir::new().unwrap();
        let config = HashTrainingConfig {
            epochs: 2,
            log_dir: dir.path().join("log"),
            ..tiny_config()
        };
        let data = prepare_data(&images(), &config).unwrap();
        let mut trainer = Trainer::<TestBackend, _>::new(
            tiny_model(),
            config,
            data.train,
            data.partition,
            data.anchor_idx,
            Default::default(),
        )
        .unwrap()
        .with_checkpoints(FailingStore)
        .with_evaluator(FailingEvaluator);

        let summary = trainer.fit().unwrap();
        assert_eq!(summary.epochs.len(), 2);
        for report in &summary.epochs {
            assert_eq!(report.steps.len(), 5);
            assert!(report.map.is_none());
            assert!(!report.is_best);
        }
        assert!(summary.best_map.is_none());
        assert_eq!(trainer.ensemble().folds(), 2);
    }
}
