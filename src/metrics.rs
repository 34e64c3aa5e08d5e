//! Metrics for evaluating neural network performance.

/// Index of the largest element; the first one wins ties. 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0usize, |max_i, (i, &v)| if v > values[max_i] { i } else { max_i })
}

/// Running totals over one pass through a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochStats {
    pub correct: usize,
    pub wrong: usize,
    pub total_loss: f64,
}

impl EpochStats {
    pub fn record(&mut self, predicted: usize, label: usize, loss: f64) {
        if predicted == label {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        self.total_loss += loss;
    }

    pub fn samples(&self) -> usize {
        self.correct + self.wrong
    }

    /// Mean loss per sample; NaN before any sample is recorded.
    pub fn mean_loss(&self) -> f64 {
        self.total_loss / self.samples() as f64
    }

    pub fn error_rate(&self) -> f64 {
        self.wrong as f64 / self.samples() as f64
    }

    pub fn accuracy(&self) -> f64 {
        self.correct as f64 / self.samples() as f64
    }
}
