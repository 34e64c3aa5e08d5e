//! A small neural network crate: fully-connected layers trained with
//! mini-batch gradient descent and hand-derived backpropagation.
//!
//! - Dense layers with the bias folded into the weight matrix
//! - ReLU, Sigmoid, Swish and Softmax activations
//! - Softmax + cross-entropy output, batch-averaged parameter updates
//! - IDX (MNIST) loader and an epoch driver with learning-rate decay

pub mod activations;
pub mod config;
pub mod datasets;
pub mod init;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod trainer;
pub mod utils;

pub use activations::Activation;
pub use config::{load_config, LayerSpec, TrainingConfig};
pub use datasets::{one_hot, InMemoryDataset, LabeledDataset, MnistDataSet};
pub use init::UniformInitializer;
pub use layers::{ForwardState, Layer, Matrix};
pub use loss::{cross_entropy_loss, softmax_cross_entropy_delta};
pub use metrics::{argmax, EpochStats};
pub use network::{Network, DEFAULT_LEARNING_RATE};
pub use trainer::{run_epoch, EpochReport, Trainer};
pub use utils::{generate_synthetic_data, log_model_summary};
