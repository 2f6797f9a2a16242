//! Ramp Schedules
//!
//! Pure functions of the epoch index that gate the learning rate, the Adam
//! moment coefficients and the consistency weight over a run. Nothing here
//! carries state; every value is recomputed at the start of each epoch.

use serde::{Deserialize, Serialize};

/// Smooth warm-up: `exp(-5 * (1 - e/r_up)^2)` until `r_up`, then 1
pub fn rampup(epoch: usize, rampup_length: usize) -> f64 {
    if epoch >= rampup_length {
        return 1.0;
    }
    let phase = 1.0 - epoch as f64 / rampup_length as f64;
    (-5.0 * phase * phase).exp()
}

/// Smooth decay over the final `r_down` epochs
pub fn rampdown(epoch: usize, total_epochs: usize, rampdown_length: usize) -> f64 {
    let start = total_epochs as f64 - rampdown_length as f64;
    if rampdown_length == 0 || (epoch as f64) < start {
        return 1.0;
    }
    let ep = (epoch as f64 - start) * 0.5;
    (-(ep * ep) / rampdown_length as f64).exp()
}

/// Hard step: 1 while `e <= r_up`, else 0
pub fn step_rampup(epoch: usize, rampup_length: usize) -> f64 {
    if epoch <= rampup_length {
        1.0
    } else {
        0.0
    }
}

/// Hyperparameters derived for one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochSchedule {
    pub epoch: usize,
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    /// Unscaled consistency weight in [0, 1]
    pub consistency_weight: f64,
}

/// Ramp-up/ramp-down schedule over a fixed number of epochs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampSchedule {
    pub total_epochs: usize,
    pub rampup_length: usize,
    pub rampdown_length: usize,
    pub base_lr: f64,
}

impl RampSchedule {
    pub fn new(total_epochs: usize, rampup_length: usize, rampdown_length: usize, base_lr: f64) -> Self {
        Self {
            total_epochs,
            rampup_length,
            rampdown_length,
            base_lr,
        }
    }

    /// Values to apply to the optimizer and loss for `epoch`
    pub fn at(&self, epoch: usize) -> EpochSchedule {
        let up = rampup(epoch, self.rampup_length);
        let down = rampdown(epoch, self.total_epochs, self.rampdown_length);
        let step = step_rampup(epoch, self.rampup_length);

        EpochSchedule {
            epoch,
            learning_rate: up * down * self.base_lr,
            beta_1: down * 0.9 + (1.0 - down) * 0.5,
            beta_2: step * 0.99 + (1.0 - step) * 0.999,
            consistency_weight: if epoch == 0 { 0.0 } else { up },
        }
    }

    /// Schedule for every epoch of the run
    pub fn table(&self) -> Vec<EpochSchedule> {
        (0..self.total_epochs).map(|e| self.at(e)).collect()
    }
}
