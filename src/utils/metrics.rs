//! Running statistics for training progress.

/// Tracks the latest value and the running average of a scalar.
#[derive(Debug, Clone, Default)]
pub struct AverageMeter {
    pub val: f64,
    pub sum: f64,
    pub count: usize,
}

impl AverageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one observation
    pub fn update(&mut self, val: f64) {
        self.update_n(val, 1);
    }

    /// Record an observation that stands for `n` samples
    pub fn update_n(&mut self, val: f64, n: usize) {
        self.val = val;
        self.sum += val * n as f64;
        self.count += n;
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_meter() {
        let mut meter = AverageMeter::new();
        assert_eq!(meter.avg(), 0.0);

        meter.update(1.0);
        meter.update(3.0);
        assert_eq!(meter.val, 3.0);
        assert!((meter.avg() - 2.0).abs() < 1e-12);

        meter.update_n(5.0, 2);
        assert!((meter.avg() - 3.5).abs() < 1e-12);

        meter.reset();
        assert_eq!(meter.count, 0);
    }
}
