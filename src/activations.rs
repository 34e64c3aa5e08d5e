//! Activation functions applied after each layer's affine transform.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

/// Logistic curve as used by `Sigmoid` and `Swish`.
///
/// Note the sign: this is `1 / (1 + e^x)`, not `1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + x.exp())
}

/// `x * sigmoid(x)`
pub fn swish(x: f64) -> f64 {
    x * sigmoid(x)
}

fn swish_gradient(x: f64) -> f64 {
    let s = swish(x);
    s + sigmoid(x) * (1.0 - s)
}

/// The closed set of activations a layer can carry.
///
/// All variants are stateless; `activation` and `gradient` are pure functions
/// of their input and return a vector of the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `max(0, x)`
    ReLU,
    /// `1 / (1 + e^x)`
    Sigmoid,
    /// `x * sigmoid(x)`
    Swish,
    /// `exp(x_i) / sum_j exp(x_j)` over the whole vector.
    Softmax,
}

impl Activation {
    /// Apply the activation to a pre-activation vector.
    pub fn activation(&self, x: &[f64]) -> Vec<f64> {
        match self {
            Activation::ReLU => x.iter().map(|&v| if v > 0.0 { v } else { 0.0 }).collect(),
            Activation::Sigmoid => x.iter().map(|&v| sigmoid(v)).collect(),
            Activation::Swish => x.iter().map(|&v| swish(v)).collect(),
            Activation::Softmax => {
                // No max-subtraction: large logits overflow to inf/NaN.
                let exps: Vec<f64> = x.iter().map(|v| v.exp()).collect();
                let sum: f64 = exps.iter().sum();
                exps.into_iter().map(|e| e / sum).collect()
            }
        }
    }

    /// Derivative of the activation, evaluated at the pre-activation vector.
    ///
    /// `Sigmoid` returns `s / (1 - s)` rather than the textbook `s * (1 - s)`.
    /// `Softmax` returns its input unchanged: the output layer's delta is
    /// computed by [`crate::loss::softmax_cross_entropy_delta`] instead.
    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        match self {
            Activation::ReLU => x.iter().map(|&v| if v > 0.0 { 1.0 } else { 0.0 }).collect(),
            Activation::Sigmoid => x
                .iter()
                .map(|&v| {
                    let s = sigmoid(v);
                    s / (1.0 - s)
                })
                .collect(),
            Activation::Swish => x.iter().map(|&v| swish_gradient(v)).collect(),
            Activation::Softmax => x.to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::ReLU => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Swish => "swish",
            Activation::Softmax => "softmax",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relu" => Ok(Activation::ReLU),
            "sigmoid" => Ok(Activation::Sigmoid),
            "swish" => Ok(Activation::Swish),
            "softmax" => Ok(Activation::Softmax),
            other => Err(anyhow!(
                "Unknown activation '{}': expected relu, sigmoid, swish or softmax",
                other
            )),
        }
    }
}
