//! Fully-connected layer with the bias folded into the weight matrix.
//!
//! A layer keeps the vectors of its most recent forward pass so that the
//! backward pass can reuse them. The expected call order per sample is
//! `forward`, then `calc_delta` (hidden layers only), then `update_grad`;
//! `update_param` may follow after any number of samples.
use crate::activations::Activation;
use crate::init::UniformInitializer;
use tracing::warn;

/// Matrix type
pub type Matrix = Vec<Vec<f64>>;

/// Whether the cached forward vectors belong to a real forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardState {
    /// Caches hold their zero initial values.
    Uninitialized,
    /// Caches hold the vectors of the last `forward` call.
    ForwardDone,
}

/// A dense layer: `output = activation(W^T · [input, 1])`.
///
/// `weights[i][j]` connects input feature `i` to output unit `j`; the last
/// row (`i == input_size`) is the bias.
#[derive(Debug, Clone)]
pub struct Layer {
    input_size: usize,
    output_size: usize,
    weights: Matrix,
    weight_grad: Matrix,
    sample_count: usize,
    last_input: Vec<f64>,
    last_pre_activation: Vec<f64>,
    last_output: Vec<f64>,
    state: ForwardState,
    activation: Activation,
}

impl Layer {
    /// Create a layer with weights drawn from `U[0, 1) / (input_size + 1)`.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        let mut init = UniformInitializer::default();
        Self::with_initializer(input_size, output_size, activation, &mut init)
    }

    /// Like [`Layer::new`] but draws from a caller-provided initializer.
    pub fn with_initializer(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: &mut UniformInitializer,
    ) -> Self {
        let rows = input_size + 1;
        let scale = rows as f64;
        let weights: Matrix = (0..rows)
            .map(|_| (0..output_size).map(|_| init.sample() / scale).collect())
            .collect();
        Self::from_weights(weights, activation)
    }

    /// Build a layer around an explicit weight matrix of
    /// `(input_size + 1) x output_size`, bias row last.
    ///
    /// Panics if the matrix has no rows or its rows differ in length.
    pub fn from_weights(weights: Matrix, activation: Activation) -> Self {
        assert!(!weights.is_empty(), "weight matrix needs at least the bias row");
        let rows = weights.len();
        let output_size = weights[0].len();
        assert!(
            weights.iter().all(|row| row.len() == output_size),
            "weight matrix rows must all have {} columns",
            output_size
        );
        Self {
            input_size: rows - 1,
            output_size,
            weight_grad: vec![vec![0.0; output_size]; rows],
            weights,
            sample_count: 0,
            last_input: vec![0.0; rows],
            last_pre_activation: vec![0.0; output_size],
            last_output: vec![0.0; output_size],
            state: ForwardState::Uninitialized,
            activation,
        }
    }

    /// Forward pass. Caches the augmented input, pre-activations and outputs
    /// for the following backward calls.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        self.last_input.clear();
        self.last_input.extend_from_slice(input);
        self.last_input.push(1.0);

        let mut u = vec![0.0; self.output_size];
        for (&x, row) in self.last_input.iter().zip(&self.weights) {
            for (uj, &w) in u.iter_mut().zip(row) {
                *uj += x * w;
            }
        }
        self.last_output = self.activation.activation(&u);
        self.last_pre_activation = u;
        self.state = ForwardState::ForwardDone;
        self.last_output.clone()
    }

    /// Backpropagated error for this layer:
    /// `delta[j] = act'(u)[j] * sum_k next_delta[k] * next_weights[j][k]`.
    ///
    /// Only the first `output_size` rows of `next_weights` are read, so the
    /// next layer's bias row never feeds back.
    pub fn calc_delta(&self, next_delta: &[f64], next_weights: &[Vec<f64>]) -> Vec<f64> {
        self.check_forward("calc_delta");
        let grad = self.activation.gradient(&self.last_pre_activation);
        grad.iter()
            .zip(next_weights)
            .map(|(&g, row)| {
                let back: f64 = next_delta.iter().zip(row).map(|(&d, &w)| d * w).sum();
                g * back
            })
            .collect()
    }

    /// Accumulate one sample's gradient `last_input ⊗ delta`.
    pub fn update_grad(&mut self, delta: &[f64]) {
        self.check_forward("update_grad");
        for (&x, grad_row) in self.last_input.iter().zip(self.weight_grad.iter_mut()) {
            for (g, &d) in grad_row.iter_mut().zip(delta) {
                *g += x * d;
            }
        }
        self.sample_count += 1;
    }

    /// Gradient descent step on the mean of the accumulated gradients, then
    /// clear the accumulator. Does nothing when no sample was accumulated.
    pub fn update_param(&mut self, learning_rate: f64) {
        if self.sample_count == 0 {
            return;
        }
        let n = self.sample_count as f64;
        for (w_row, g_row) in self.weights.iter_mut().zip(self.weight_grad.iter_mut()) {
            for (w, g) in w_row.iter_mut().zip(g_row.iter_mut()) {
                *w -= learning_rate * *g / n;
                *g = 0.0;
            }
        }
        self.sample_count = 0;
    }

    fn check_forward(&self, op: &str) {
        if self.state == ForwardState::Uninitialized {
            warn!(operation = op, "layer used before any forward pass; reading zeroed cache");
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn weight_gradients(&self) -> &Matrix {
        &self.weight_grad
    }

    /// Samples accumulated since the last `update_param`.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Input of the last forward pass with the trailing `1`.
    pub fn last_input(&self) -> &[f64] {
        &self.last_input
    }

    pub fn last_pre_activation(&self) -> &[f64] {
        &self.last_pre_activation
    }

    pub fn last_output(&self) -> &[f64] {
        &self.last_output
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn state(&self) -> ForwardState {
        self.state
    }
}
