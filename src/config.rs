//! Training configuration, loadable from JSON.
//!
//! Every field is optional in the file; missing ones take the defaults
//! below, which reproduce the reference MNIST run (one 300-unit ReLU hidden
//! layer, learning rate 0.2 halved on loss plateaus, batches of 100).
//!
//! ```json
//! {
//!   "epochs": 20,
//!   "learning_rate": 0.2,
//!   "batch_size": 100,
//!   "hidden_layers": [{ "size": 300, "activation": "relu" }],
//!   "seed": 1
//! }
//! ```
use crate::activations::Activation;
use crate::init::UniformInitializer;
use crate::layers::Layer;
use crate::network::Network;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One hidden layer: width and activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: Activation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Samples accumulated per parameter update.
    pub batch_size: usize,
    /// Learning-rate multiplier applied when the training loss gets worse.
    pub lr_decay: f64,
    pub hidden_layers: Vec<LayerSpec>,
    /// Seed for weight initialization; entropy when absent.
    pub seed: Option<u64>,
    /// Log per-layer deltas during backpropagation.
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.2,
            batch_size: 100,
            lr_decay: 0.5,
            hidden_layers: vec![LayerSpec {
                size: 300,
                activation: Activation::ReLU,
            }],
            seed: None,
            verbose: false,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            bail!("lr_decay must be in (0, 1], got {}", self.lr_decay);
        }
        if let Some(i) = self.hidden_layers.iter().position(|l| l.size == 0) {
            bail!("hidden layer {} has size 0", i);
        }
        Ok(())
    }

    /// Hidden layers as configured, then a softmax output layer of `num_classes`.
    pub fn build_network(&self, input_size: usize, num_classes: usize) -> Network {
        let mut init = match self.seed {
            Some(seed) => UniformInitializer::seeded(0.0, 1.0, seed),
            None => UniformInitializer::default(),
        };
        let mut net = Network::verbose(self.verbose);
        let mut prev = input_size;
        for spec in &self.hidden_layers {
            net.add_layer(Layer::with_initializer(prev, spec.size, spec.activation, &mut init));
            prev = spec.size;
        }
        net.add_layer(Layer::with_initializer(
            prev,
            num_classes,
            Activation::Softmax,
            &mut init,
        ));
        net
    }
}

/// Read and validate a JSON training configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: TrainingConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
