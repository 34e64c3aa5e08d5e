// Forward-pass behaviour of activations, layers and networks.

use approx::assert_relative_eq;
use primitive_nn::{Activation, Layer, Network, UniformInitializer};

const ALL: [Activation; 4] = [
    Activation::ReLU,
    Activation::Sigmoid,
    Activation::Swish,
    Activation::Softmax,
];

#[test]
fn empty_vectors_stay_empty() {
    for act in ALL {
        assert!(act.activation(&[]).is_empty(), "{} activation", act);
        assert!(act.gradient(&[]).is_empty(), "{} gradient", act);
    }
}

#[test]
fn single_element_softmax_is_one() {
    assert_eq!(Activation::Softmax.activation(&[3.7]), vec![1.0]);
    assert_eq!(Activation::Softmax.activation(&[-12.0]), vec![1.0]);
}

#[test]
fn softmax_is_a_distribution() {
    let x = [-3.0, 0.0, 0.5, 2.0, 7.5];
    let y = Activation::Softmax.activation(&x);
    assert_relative_eq!(y.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    assert!(y.iter().all(|&p| p > 0.0 && p < 1.0));
    // order preserved
    assert!(y.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn relu_gradient_boundary() {
    let g = Activation::ReLU.gradient(&[-1e-9, 0.0, 1e-9, 5.0]);
    assert_eq!(g, vec![0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn activations_preserve_length() {
    let x: Vec<f64> = (0..17).map(|i| i as f64 / 4.0 - 2.0).collect();
    for act in ALL {
        assert_eq!(act.activation(&x).len(), x.len());
        assert_eq!(act.gradient(&x).len(), x.len());
    }
}

#[test]
fn layer_output_has_output_size() {
    let mut init = UniformInitializer::seeded(0.0, 1.0, 5);
    for act in ALL {
        let mut layer = Layer::with_initializer(6, 4, act, &mut init);
        let out = layer.forward(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(out.len(), 4);
        assert_eq!(layer.last_output(), out.as_slice());
        assert_eq!(layer.last_input().len(), 7);
        assert_eq!(*layer.last_input().last().unwrap(), 1.0);
    }
}

#[test]
fn network_output_has_last_layer_size() {
    let mut net = Network::new();
    net.add_layer(Layer::new(8, 5, Activation::Swish));
    net.add_layer(Layer::new(5, 6, Activation::ReLU));
    net.add_layer(Layer::new(6, 3, Activation::Softmax));
    let out = net.forward(&[0.5; 8]);
    assert_eq!(out.len(), 3);
    assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    // intermediate layers keep their own forward state
    assert_eq!(net.layers()[0].last_output().len(), 5);
    assert_eq!(net.layers()[1].last_input().len(), 6);
}

#[test]
fn single_softmax_layer_matches_hand_computation() {
    // rows: x0, x1, bias
    let weights = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![0.0, 0.0]];
    let mut net = Network::new();
    net.add_layer(Layer::from_weights(weights, Activation::Softmax));
    let out = net.forward(&[1.0, 0.0]);

    let (u0, u1) = (1.0f64, 2.0f64);
    let denom = u0.exp() + u1.exp();
    assert_relative_eq!(out[0], u0.exp() / denom, epsilon = 1e-12);
    assert_relative_eq!(out[1], u1.exp() / denom, epsilon = 1e-12);
    assert_eq!(net.layers()[0].last_pre_activation(), &[1.0, 2.0]);
}

#[test]
fn bias_row_shifts_pre_activation() {
    let weights = vec![vec![1.0], vec![-2.0]];
    let mut layer = Layer::from_weights(weights, Activation::ReLU);
    assert_eq!(layer.forward(&[1.5]), vec![0.0]);
    assert_eq!(layer.forward(&[3.0]), vec![1.0]);
}
