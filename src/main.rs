//! Anchor Hash CLI
//!
//! Entry point for training semi-supervised hashing networks with the Burn
//! framework on CIFAR-10, an image folder, or a synthetic smoke-test set.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use anchor_hash::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use anchor_hash::dataset::synthetic::{generate, SyntheticConfig};
use anchor_hash::dataset::{cifar10, folder, HashBatcher, ImageSet, Normalization};
use anchor_hash::evaluation::HammingMapEvaluator;
use anchor_hash::model::{AnchorFold, HashNetConfig, HashTrainingConfig};
use anchor_hash::training::{prepare_data, FileCheckpointStore, RampSchedule, Trainer, TrainingSummary};
use anchor_hash::utils::format_duration;
use anchor_hash::utils::logging::{init_logging, LogConfig, LogLevel};

/// Semi-supervised deep hashing with anchors and temporal ensembling
#[derive(Parser, Debug)]
#[command(name = "anchor_hash")]
#[command(version)]
#[command(about = "Semi-supervised deep hashing with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Explicit log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DataFormat {
    /// CIFAR-10 binary batches (data_batch_{1..5}.bin, test_batch.bin)
    Cifar10,
    /// One sub-directory of images per class
    Folder,
}

/// Flags shared by every training command; they override `--config`
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON run configuration loaded before the flags below are applied
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset name used in checkpoint file names
    #[arg(long)]
    dataset: Option<String>,

    /// Checkpoint directory
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Log directory
    #[arg(long)]
    log: Option<PathBuf>,

    /// Number of training epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Indices per training step
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Labeled indices per training step
    #[arg(long)]
    labeled_per_batch: Option<usize>,

    /// Peak learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Hash code length
    #[arg(long)]
    num_bits: Option<usize>,

    /// Number of classes
    #[arg(long)]
    num_classes: Option<usize>,

    /// Labeled training samples
    #[arg(long)]
    labeled: Option<usize>,

    /// Query samples held out per class
    #[arg(long)]
    query_per_class: Option<usize>,

    /// Anchor set size
    #[arg(long)]
    anchor_num: Option<usize>,

    /// Anchors drawn per step
    #[arg(long)]
    anchor_subsample: Option<usize>,

    /// Fold the anchor ensemble after every step instead of every epoch
    #[arg(long, default_value = "false")]
    anchor_fold_per_step: bool,

    /// Weight of the labeled x labeled pairwise term
    #[arg(long)]
    gamma: Option<f64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn resolve(&self) -> Result<HashTrainingConfig> {
        let mut config = match &self.config {
            Some(path) => HashTrainingConfig::load(path)
                .with_context(|| format!("loading run configuration {:?}", path))?,
            None => HashTrainingConfig::default(),
        };

        if let Some(v) = &self.dataset {
            config.dataset = v.clone();
        }
        if let Some(v) = &self.checkpoint {
            config.checkpoint_dir = v.clone();
        }
        if let Some(v) = &self.log {
            config.log_dir = v.clone();
        }
        if let Some(v) = self.epochs {
            config.epochs = v;
        }
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.labeled_per_batch {
            config.labeled_per_batch = v;
        }
        if let Some(v) = self.learning_rate {
            config.base_lr = v;
        }
        if let Some(v) = self.num_bits {
            config.num_bits = v;
        }
        if let Some(v) = self.num_classes {
            config.num_classes = v;
        }
        if let Some(v) = self.labeled {
            config.labeled_total = v;
        }
        if let Some(v) = self.query_per_class {
            config.query_per_class = v;
        }
        if let Some(v) = self.anchor_num {
            config.anchor_count = v;
        }
        if let Some(v) = self.anchor_subsample {
            config.anchor_subsample = v;
        }
        if self.anchor_fold_per_step {
            config.anchor_fold = AnchorFold::PerStep;
        }
        if let Some(v) = self.gamma {
            config.gamma = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train on CIFAR-10 binaries or an image folder
    Train {
        /// Dataset directory
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Layout of the dataset directory
        #[arg(long, value_enum, default_value = "cifar10")]
        format: DataFormat,

        /// Square side images are resized to (folder format only)
        #[arg(long, default_value = "32")]
        image_size: usize,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Train on generated class-clustered images
    Synthetic {
        /// Number of generated images
        #[arg(long, default_value = "400")]
        samples: usize,

        /// Image side in pixels
        #[arg(long, default_value = "8")]
        side: usize,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the per-epoch learning rate, betas and consistency weight
    Schedule {
        #[arg(short, long, default_value = "100")]
        epochs: usize,

        #[arg(long, default_value = "40")]
        rampup: usize,

        #[arg(long, default_value = "40")]
        rampdown: usize,

        #[arg(long, default_value = "0.00005")]
        learning_rate: f64,

        /// Multiplier applied to the consistency weight
        #[arg(long, default_value = "20")]
        consistency_scale: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Some(level) = &cli.log_level {
        log_config.level = level.parse::<LogLevel>()?;
    }
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            format,
            image_size,
            run,
        } => {
            let config = run.resolve()?;
            let images = match format {
                DataFormat::Cifar10 => cifar10::load_all(&data_dir)
                    .with_context(|| format!("loading CIFAR-10 from {:?}", data_dir))?,
                DataFormat::Folder => folder::load_image_folder(&data_dir, image_size)
                    .with_context(|| format!("loading image folder {:?}", data_dir))?,
            };
            cmd_train(images, config)?;
        }

        Commands::Synthetic { samples, side, run } => {
            let mut config = run.resolve()?;
            if run.dataset.is_none() {
                config.dataset = "synthetic".to_string();
            }
            let images = generate(&SyntheticConfig {
                num_classes: config.num_classes,
                samples,
                side,
                seed: config.seed,
                ..Default::default()
            })?;
            cmd_train(images, config)?;
        }

        Commands::Schedule {
            epochs,
            rampup,
            rampdown,
            learning_rate,
            consistency_scale,
        } => {
            cmd_schedule(epochs, rampup, rampdown, learning_rate, consistency_scale);
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════════════════════╗
 ║   Anchor Hash                                                    ║
 ║   Semi-Supervised Deep Hashing with Burn + Rust                  ║
 ╚══════════════════════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn cmd_train(images: ImageSet, config: HashTrainingConfig) -> Result<()> {
    println!("{} {}", "Backend:".cyan().bold(), backend_name());
    println!(
        "{} {} images, {} classes, {}x{}x{}",
        "Dataset:".cyan().bold(),
        images.len(),
        images.num_classes(),
        images.channels,
        images.height,
        images.width
    );

    std::fs::create_dir_all(&config.checkpoint_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;
    let config_path = config
        .log_dir
        .join(format!("{}_config.json", config.checkpoint_stem()));
    config.save(&config_path)?;
    info!("Run configuration written to {:?}", config_path);

    let device = default_device();
    let data = prepare_data(&images, &config)?;

    let model = HashNetConfig::new()
        .with_num_bits(config.num_bits)
        .with_in_channels(images.channels)
        .init::<TrainingBackend>(&device);

    let mut trainer = Trainer::new(
        model,
        config.clone(),
        data.train.clone(),
        data.partition,
        data.anchor_idx,
        device.clone(),
    )?
    .with_checkpoints(FileCheckpointStore::from_config(&config));

    if let Some(query) = data.query {
        let batcher = HashBatcher::for_images(
            data.train.images(),
            Normalization::for_channels(images.channels),
        );
        trainer = trainer.with_evaluator(HammingMapEvaluator::<DefaultBackend>::new(
            query,
            data.train,
            batcher,
            config.batch_size,
            config.map_top_k,
            device,
        ));
    }

    let summary = trainer.fit()?;
    print_summary(&summary, &config);
    Ok(())
}

fn print_summary(summary: &TrainingSummary, config: &HashTrainingConfig) {
    let elapsed: f64 = summary.epochs.iter().map(|e| e.elapsed_secs).sum();

    println!();
    println!("{}", "Training finished".green().bold());
    println!("  Epochs:      {}", summary.epochs.len());
    println!("  Time:        {}", format_duration(elapsed));
    if let Some(last) = summary.epochs.last() {
        println!(
            "  Final loss:  {:.4} (pairwise {:.4}, consistency {:.4})",
            last.mean_total, last.mean_pairwise, last.mean_consistency
        );
    }
    match summary.best_map {
        Some(map) => println!("  Best mAP:    {}", format!("{:.4}", map).yellow().bold()),
        None => println!("  Best mAP:    {}", "not evaluated".dimmed()),
    }
    println!("  Checkpoints: {:?}", config.checkpoint_dir);
}

fn cmd_schedule(epochs: usize, rampup: usize, rampdown: usize, learning_rate: f64, consistency_scale: f64) {
    let schedule = RampSchedule::new(epochs, rampup, rampdown, learning_rate);

    println!(
        "{}",
        format!(
            "{:>6} {:>12} {:>8} {:>8} {:>10}",
            "epoch", "lr", "beta1", "beta2", "u_weight"
        )
        .bold()
    );
    for row in schedule.table() {
        println!(
            "{:>6} {:>12.4e} {:>8.4} {:>8.4} {:>10.4}",
            row.epoch,
            row.learning_rate,
            row.beta_1,
            row.beta_2,
            row.consistency_weight * consistency_scale
        );
    }
}
