//! Logging Module
//!
//! Structured logging on top of the `tracing` crate, plus a per-epoch
//! training logger that reports timing and the three loss components.

use std::str::FromStr;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use super::error::{HashError, Result};

/// Level applied to every target outside this crate
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this crate's own events
    pub level: LogLevel,
    /// Print the module path of every event
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
        }
    }
}

impl LogConfig {
    /// Debug output with module paths, for step-level tracing
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
        }
    }

    /// Filter directive: this crate at `level`, dependencies (burn, cubecl) at warn
    pub fn directive(&self) -> String {
        format!(
            "{},{}={}",
            DEPENDENCY_LEVEL,
            env!("CARGO_CRATE_NAME"),
            self.level.as_str()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(HashError::Config(format!("unknown log level '{}'", other))),
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, replaces the directive built from `config`.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))
        .map_err(|e| HashError::Config(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target)
        .compact()
        .try_init()
        .map_err(|e| HashError::Config(format!("failed to initialize logging: {}", e)))
}

/// Per-epoch progress logger for the hashing trainer
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    epoch_start: Instant,
    training_start: Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: Instant::now(),
            training_start: Instant::now(),
        }
    }

    /// Log start of an epoch
    pub fn start_epoch(&mut self, epoch: usize, learning_rate: f64, consistency_weight: f64) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();

        tracing::debug!(
            "Epoch {}/{} started (lr = {:.3e}, consistency weight = {:.4})",
            epoch,
            self.total_epochs,
            learning_rate,
            consistency_weight
        );
    }

    /// Seconds since the current epoch started
    pub fn epoch_elapsed(&self) -> f64 {
        self.epoch_start.elapsed().as_secs_f64()
    }

    /// Log end of an epoch with the loss breakdown and evaluation score
    pub fn end_epoch(
        &self,
        steps: usize,
        losses: (f64, f64, f64),
        map: Option<f64>,
        learning_rate: f64,
    ) {
        let (total, pairwise, consistency) = losses;
        let map = map
            .map(|m| format!("{:.4}", m))
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            "Epoch[{}/{}] steps {} in {:.1}s | Loss_H: {:.4}/{:.4}/{:.4} | mAP: {} | LR: {:.3e}",
            self.epoch,
            self.total_epochs,
            steps,
            self.epoch_elapsed(),
            total,
            pairwise,
            consistency,
            map,
            learning_rate
        );
    }

    /// Log a new best model
    pub fn log_new_best(&self, map: f64) {
        tracing::info!("New best model! mAP: {:.4}", map);
    }

    /// Log training completion
    pub fn log_complete(&self, best_map: Option<f64>) {
        let total_time = self.training_start.elapsed();

        match best_map {
            Some(best) => tracing::info!(
                "Training complete! {} epochs in {:.1}s | Best mAP: {:.4}",
                self.total_epochs,
                total_time.as_secs_f64(),
                best
            ),
            None => tracing::info!(
                "Training complete! {} epochs in {:.1}s",
                self.total_epochs,
                total_time.as_secs_f64()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_directive_scopes_crate_level() {
        assert_eq!(LogConfig::default().directive(), "warn,anchor_hash=info");
        assert_eq!(LogConfig::verbose().directive(), "warn,anchor_hash=debug");
        assert!(EnvFilter::try_new(LogConfig::verbose().directive()).is_ok());
    }
}
