//! Feedforward network: an ordered stack of [`Layer`]s trained by backpropagation.
use crate::activations::Activation;
use crate::layers::Layer;
use crate::loss::{cross_entropy_loss, softmax_cross_entropy_delta};
use std::fmt;
use tracing::{debug, warn};

/// Learning rate used by [`Network::update_param_default`].
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// An ordered stack of layers trained with softmax + cross-entropy.
///
/// Layer `k`'s output size must equal layer `k + 1`'s input size; this is
/// not checked. `backward` and `calc_loss` read the state left by the most
/// recent `forward`.
#[derive(Debug, Clone, Default)]
pub struct Network {
    layers: Vec<Layer>,
    /// Log every layer's delta during `backward`.
    verbose: bool,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(verbose: bool) -> Self {
        Self {
            layers: Vec::new(),
            verbose,
        }
    }

    /// Append a layer after the current output layer.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Input width of the first layer, or 0 for an empty network.
    pub fn input_size(&self) -> usize {
        self.layers.first().map(Layer::input_size).unwrap_or(0)
    }

    /// Output width of the last layer, or 0 for an empty network.
    pub fn output_size(&self) -> usize {
        self.layers.last().map(Layer::output_size).unwrap_or(0)
    }

    /// Forward pass from input to output. An empty network returns its input.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Cross-entropy of the last forward output against a one-hot `target`.
    ///
    /// Panics on an empty network.
    pub fn calc_loss(&self, target: &[f64]) -> f64 {
        let last = self.layers.last().expect("network has no layers");
        cross_entropy_loss(last.last_output(), target)
    }

    /// Backpropagate `target` through every layer and accumulate one gradient
    /// sample per layer, last layer first.
    ///
    /// The output delta is `output - target`, which assumes a softmax output
    /// layer trained against cross-entropy.
    ///
    /// Panics on an empty network.
    pub fn backward(&mut self, target: &[f64]) {
        let n = self.layers.len();
        let last = self.layers.last_mut().expect("network has no layers");
        if last.activation() != Activation::Softmax {
            warn!(
                activation = %last.activation(),
                "output delta assumes softmax + cross-entropy"
            );
        }
        let mut delta = softmax_cross_entropy_delta(last.last_output(), target);
        if self.verbose {
            debug!(layer = n - 1, ?delta, "delta");
        }
        last.update_grad(&delta);

        for l in (0..n - 1).rev() {
            let (head, tail) = self.layers.split_at_mut(l + 1);
            let layer = &mut head[l];
            delta = layer.calc_delta(&delta, tail[0].weights());
            layer.update_grad(&delta);
            if self.verbose {
                debug!(layer = l, ?delta, "delta");
            }
        }
    }

    /// Apply the averaged accumulated gradients in every layer.
    pub fn update_param(&mut self, learning_rate: f64) {
        for layer in &mut self.layers {
            layer.update_param(learning_rate);
        }
    }

    pub fn update_param_default(&mut self) {
        self.update_param(DEFAULT_LEARNING_RATE);
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes = vec![self.input_size()];
        for layer in &self.layers {
            sizes.push(layer.output_size());
        }
        write!(f, "Network: {:?}", sizes)
    }
}
