//! End-to-end training on a small synthetic dataset with the CPU backend.

use anchor_hash::dataset::synthetic::{generate, SyntheticConfig};
use anchor_hash::dataset::{HashBatcher, HashDataset, Normalization};
use anchor_hash::evaluation::HammingMapEvaluator;
use anchor_hash::model::{HashNet, HashNetConfig, HashTrainingConfig};
use anchor_hash::training::{prepare_data, FileCheckpointStore, Trainer};
use burn::backend::Autodiff;
use burn::data::dataset::Dataset;
use burn_ndarray::NdArray;
use tempfile::TempDir;

type TestBackend = Autodiff<NdArray>;

fn config(dir: &TempDir) -> HashTrainingConfig {
    HashTrainingConfig {
        dataset: "synthetic".to_string(),
        epochs: 2,
        batch_size: 10,
        labeled_per_batch: 4,
        anchor_count: 10,
        anchor_subsample: 10,
        num_bits: 12,
        num_classes: 10,
        labeled_total: 20,
        query_per_class: 0,
        rampup_length: 1,
        rampdown_length: 1,
        base_lr: 1e-3,
        checkpoint_dir: dir.path().join("checkpoint"),
        log_dir: dir.path().join("log"),
        ..Default::default()
    }
}

fn model() -> HashNet<TestBackend> {
    HashNetConfig::new()
        .with_num_bits(12)
        .with_num_blocks(2)
        .with_base_filters(4)
        .with_hidden_units(16)
        .init(&Default::default())
}

#[test]
fn two_epochs_on_synthetic_data() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let images = generate(&SyntheticConfig {
        num_classes: 10,
        samples: 100,
        side: 8,
        ..Default::default()
    })
    .unwrap();

    let data = prepare_data(&images, &config).unwrap();
    assert_eq!(data.train.len(), 100);
    assert_eq!(data.partition.labeled_idx.len(), 20);

    // queries: two fresh samples of every class, gallery: the training set
    let query_images = generate(&SyntheticConfig {
        num_classes: 10,
        samples: 20,
        side: 8,
        ..Default::default()
    })
    .unwrap();
    let evaluator = HammingMapEvaluator::<NdArray>::new(
        HashDataset::new(query_images),
        data.train.clone(),
        HashBatcher::for_images(data.train.images(), Normalization::for_channels(3)),
        25,
        None,
        Default::default(),
    );

    let mut trainer = Trainer::<TestBackend, _>::new(
        model(),
        config.clone(),
        data.train,
        data.partition,
        data.anchor_idx,
        Default::default(),
    )
    .unwrap()
    .with_evaluator(evaluator)
    .with_checkpoints(FileCheckpointStore::from_config(&config));

    let summary = trainer.fit().unwrap();

    assert_eq!(summary.epochs.len(), 2);
    for report in &summary.epochs {
        // 80 unlabeled / 6 = 13, 20 labeled / 4 = 5
        assert_eq!(report.steps.len(), 5);
        for step in &report.steps {
            assert!(step.total.is_finite());
            assert!(step.pairwise.is_finite());
            assert!(step.consistency.is_finite());
        }
        let map = report.map.expect("evaluated every epoch");
        assert!((0.0..=1.0).contains(&map));
    }
    assert_eq!(summary.epochs[0].schedule.consistency_weight, 0.0);
    assert!(summary.epochs[0].is_best);
    assert!(summary.best_map.is_some());

    // every touched index holds a non-zero embedding in both stores
    let ensemble = trainer.ensemble();
    assert!(ensemble.touched_count() > 0);
    for row in 0..ensemble.len() {
        if ensemble.is_touched(row) {
            let values = ensemble.current_row(row).unwrap();
            assert!(values.iter().any(|&v| v != 0.0));
            assert!(ensemble.target_row(row).unwrap().iter().any(|&v| v != 0.0));
        }
    }
    let anchor_store = trainer.anchors().store();
    assert_eq!(anchor_store.touched_count(), 10);
    for row in 0..anchor_store.len() {
        assert!(anchor_store.current_row(row).unwrap().iter().any(|&v| v != 0.0));
    }

    let store = FileCheckpointStore::from_config(&config);
    assert!(store.model_path(false).exists());
    assert!(store.model_path(true).exists());
    let latest = store.load_state(false).unwrap();
    assert_eq!(latest.completed_epoch, 1);
    assert_eq!(latest.next_epoch, 2);
    assert!(config
        .log_dir
        .join("cnn_synthetic_12bits_summary.json")
        .exists());
}
