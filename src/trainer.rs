//! Epoch driver: mini-batch training, evaluation and learning-rate decay.
use crate::config::TrainingConfig;
use crate::datasets::LabeledDataset;
use crate::metrics::{argmax, EpochStats};
use crate::network::Network;
use anyhow::{bail, Result};
use tracing::{debug, info};

/// One pass over `dataset`.
///
/// Every sample is forwarded and scored. With `train` set, each sample is
/// also backpropagated and parameters are updated every `batch_size`
/// samples and once more after the last sample.
pub fn run_epoch<D: LabeledDataset + ?Sized>(
    net: &mut Network,
    dataset: &D,
    train: bool,
    learning_rate: f64,
    batch_size: usize,
) -> EpochStats {
    let batch_size = batch_size.max(1);
    let mut stats = EpochStats::default();
    let mut batch_loss = 0.0;
    let mut batch_id = 0usize;
    let n = dataset.len();
    for sample in 0..n {
        let output = net.forward(&dataset.input(sample));
        let target = dataset.one_hot(sample);
        let loss = net.calc_loss(&target);
        stats.record(argmax(&output), dataset.label(sample), loss);
        batch_loss += loss;

        if train {
            net.backward(&target);
            // Batches end after `batch_size` samples, not after sample 0 as in
            // a `sample % batch_size == 0` schedule.
            let in_batch = sample % batch_size + 1;
            if in_batch == batch_size || sample + 1 == n {
                debug!(batch = batch_id, loss = batch_loss / in_batch as f64, "batch loss");
                net.update_param(learning_rate);
                batch_loss = 0.0;
                batch_id += 1;
            }
        }
    }
    stats
}

/// Losses and error rates of one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub learning_rate: f64,
    pub train: EpochStats,
    pub test: Option<EpochStats>,
}

/// Runs epochs and halves (by `lr_decay`) the learning rate whenever the
/// training loss rises.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    learning_rate: f64,
    prev_loss: f64,
    history: Vec<EpochReport>,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            learning_rate: config.learning_rate,
            config,
            prev_loss: f64::MAX,
            history: Vec::new(),
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn history(&self) -> &[EpochReport] {
        &self.history
    }

    /// Train for one epoch, optionally evaluate on `test`, then adapt the
    /// learning rate.
    pub fn step<D, T>(&mut self, net: &mut Network, train: &D, test: Option<&T>) -> Result<EpochReport>
    where
        D: LabeledDataset + ?Sized,
        T: LabeledDataset + ?Sized,
    {
        if train.is_empty() {
            bail!("Training set is empty");
        }
        let epoch = self.history.len();
        let lr = self.learning_rate;
        info!(epoch = epoch, learning_rate = lr, "running epoch");
        let train_stats = run_epoch(net, train, true, lr, self.config.batch_size);
        info!(
            epoch = epoch,
            mean_loss = train_stats.mean_loss(),
            error_rate = train_stats.error_rate(),
            "train set"
        );

        let test_stats = match test {
            Some(set) if !set.is_empty() => {
                let s = run_epoch(net, set, false, lr, self.config.batch_size);
                info!(
                    epoch = epoch,
                    mean_loss = s.mean_loss(),
                    error_rate = s.error_rate(),
                    "test set"
                );
                Some(s)
            }
            _ => None,
        };

        let loss = train_stats.mean_loss();
        if self.prev_loss < loss {
            self.learning_rate *= self.config.lr_decay;
            info!(
                mean_loss = loss,
                prev_loss = self.prev_loss,
                learning_rate = self.learning_rate,
                "loss got worse, decaying learning rate"
            );
        }
        self.prev_loss = loss;

        let report = EpochReport {
            epoch,
            learning_rate: lr,
            train: train_stats,
            test: test_stats,
        };
        self.history.push(report);
        Ok(report)
    }

    /// Run all configured epochs.
    pub fn fit<D, T>(&mut self, net: &mut Network, train: &D, test: Option<&T>) -> Result<&[EpochReport]>
    where
        D: LabeledDataset + ?Sized,
        T: LabeledDataset + ?Sized,
    {
        for _ in 0..self.config.epochs {
            self.step(net, train, test)?;
        }
        Ok(&self.history)
    }
}
