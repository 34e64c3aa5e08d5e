// Backpropagation, gradient accumulation and parameter updates.

use approx::assert_relative_eq;
use primitive_nn::{Activation, ForwardState, Layer, Matrix, Network, UniformInitializer};

fn seeded_net(seed: u64) -> Network {
    let mut init = UniformInitializer::seeded(0.0, 1.0, seed);
    let mut net = Network::new();
    net.add_layer(Layer::with_initializer(4, 5, Activation::ReLU, &mut init));
    net.add_layer(Layer::with_initializer(5, 3, Activation::Softmax, &mut init));
    net
}

fn net_from(weights: &[Matrix]) -> Network {
    let mut net = Network::new();
    let n = weights.len();
    for (i, w) in weights.iter().enumerate() {
        let act = if i + 1 == n {
            Activation::Softmax
        } else {
            Activation::ReLU
        };
        net.add_layer(Layer::from_weights(w.clone(), act));
    }
    net
}

fn all_weights(net: &Network) -> Vec<Matrix> {
    net.layers().iter().map(|l| l.weights().clone()).collect()
}

const INPUT: [f64; 4] = [0.9, 0.1, 0.4, 0.7];
const TARGET: [f64; 3] = [0.0, 0.0, 1.0];

#[test]
fn one_step_decreases_loss() {
    let mut net = seeded_net(17);
    net.forward(&INPUT);
    let before = net.calc_loss(&TARGET);
    net.backward(&TARGET);
    net.update_param(0.05);
    net.forward(&INPUT);
    let after = net.calc_loss(&TARGET);
    assert!(after < before, "loss went from {} to {}", before, after);
}

#[test]
fn repeated_steps_keep_decreasing_loss() {
    let mut net = seeded_net(23);
    let mut prev = f64::MAX;
    for _ in 0..20 {
        net.forward(&INPUT);
        let loss = net.calc_loss(&TARGET);
        assert!(loss < prev);
        prev = loss;
        net.backward(&TARGET);
        net.update_param(0.05);
    }
}

#[test]
fn batch_of_identical_samples_equals_single_sample() {
    let mut batched = seeded_net(99);
    let mut single = seeded_net(99);
    assert_eq!(all_weights(&batched), all_weights(&single));

    for _ in 0..7 {
        batched.forward(&INPUT);
        batched.backward(&TARGET);
    }
    assert!(batched.layers().iter().all(|l| l.sample_count() == 7));
    batched.update_param(0.3);

    single.forward(&INPUT);
    single.backward(&TARGET);
    single.update_param(0.3);

    for (a, b) in all_weights(&batched).iter().zip(all_weights(&single).iter()) {
        for (ra, rb) in a.iter().zip(b) {
            for (&wa, &wb) in ra.iter().zip(rb) {
                assert_relative_eq!(wa, wb, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn update_param_without_samples_changes_nothing() {
    let mut net = seeded_net(4);
    let before = all_weights(&net);
    net.update_param(0.5);
    net.update_param_default();
    assert_eq!(all_weights(&net), before);
    assert!(net
        .layers()
        .iter()
        .all(|l| l.weight_gradients().iter().flatten().all(|&g| g == 0.0)));
}

#[test]
fn update_param_clears_accumulators() {
    let mut net = seeded_net(8);
    net.forward(&INPUT);
    net.backward(&TARGET);
    assert!(net.layers()[1]
        .weight_gradients()
        .iter()
        .flatten()
        .any(|&g| g != 0.0));
    net.update_param(0.1);
    for layer in net.layers() {
        assert_eq!(layer.sample_count(), 0);
        assert!(layer.weight_gradients().iter().flatten().all(|&g| g == 0.0));
    }
}

#[test]
fn output_delta_is_output_minus_target() {
    let mut net = seeded_net(31);
    let out = net.forward(&INPUT);
    net.backward(&TARGET);
    let last = &net.layers()[1];
    let hidden = net.layers()[0].last_output();
    // gradient of the bias row equals the delta itself
    for j in 0..3 {
        assert_relative_eq!(last.weight_gradients()[5][j], out[j] - TARGET[j], epsilon = 1e-12);
        assert_relative_eq!(
            last.weight_gradients()[0][j],
            hidden[0] * (out[j] - TARGET[j]),
            epsilon = 1e-12
        );
    }
}

#[test]
fn calc_delta_matches_manual_chain_rule() {
    let mut net = seeded_net(12);
    let out = net.forward(&INPUT);
    let delta_out: Vec<f64> = out.iter().zip(TARGET).map(|(&o, t)| o - t).collect();
    let hidden = &net.layers()[0];
    let next_w = net.layers()[1].weights();
    let delta = hidden.calc_delta(&delta_out, next_w);
    assert_eq!(delta.len(), 5);
    for j in 0..5 {
        let active = if hidden.last_pre_activation()[j] > 0.0 { 1.0 } else { 0.0 };
        let back: f64 = (0..3).map(|k| delta_out[k] * next_w[j][k]).sum();
        assert_relative_eq!(delta[j], active * back, epsilon = 1e-12);
    }
}

#[test]
fn gradients_match_finite_differences() {
    let base = all_weights(&seeded_net(41));
    let mut net = net_from(&base);
    net.forward(&INPUT);
    net.backward(&TARGET);
    let analytic: Vec<Matrix> = net
        .layers()
        .iter()
        .map(|l| l.weight_gradients().clone())
        .collect();

    let h = 1e-6;
    let loss_at = |weights: &[Matrix]| {
        let mut n = net_from(weights);
        n.forward(&INPUT);
        n.calc_loss(&TARGET)
    };
    for (l, layer_w) in base.iter().enumerate() {
        for i in 0..layer_w.len() {
            for j in 0..layer_w[i].len() {
                let mut plus = base.clone();
                plus[l][i][j] += h;
                let mut minus = base.clone();
                minus[l][i][j] -= h;
                let numeric = (loss_at(&plus) - loss_at(&minus)) / (2.0 * h);
                assert_relative_eq!(analytic[l][i][j], numeric, epsilon = 1e-6);
            }
        }
    }
}

#[test]
fn every_layer_accumulates_once_per_backward() {
    let mut net = Network::new();
    net.add_layer(Layer::new(4, 6, Activation::Sigmoid));
    net.add_layer(Layer::new(6, 6, Activation::Swish));
    net.add_layer(Layer::new(6, 5, Activation::ReLU));
    net.add_layer(Layer::new(5, 3, Activation::Softmax));
    for n in 1..=3 {
        net.forward(&INPUT);
        net.backward(&TARGET);
        assert!(net.layers().iter().all(|l| l.sample_count() == n));
    }
}

#[test]
fn backward_before_forward_runs_on_zeroed_cache() {
    let mut net = seeded_net(6);
    assert!(net
        .layers()
        .iter()
        .all(|l| l.state() == ForwardState::Uninitialized));
    net.backward(&TARGET);
    for layer in net.layers() {
        assert_eq!(layer.sample_count(), 1);
        assert_eq!(layer.state(), ForwardState::Uninitialized);
        // the cached input, bias slot included, is all zeros
        assert!(layer.last_input().iter().all(|&x| x == 0.0));
        assert!(layer.weight_gradients().iter().flatten().all(|&g| g == 0.0));
    }
    net.update_param(0.1);
    assert!(net.layers().iter().all(|l| l.sample_count() == 0));
}

#[test]
fn calc_delta_before_forward_is_zero() {
    let net = seeded_net(6);
    let hidden = &net.layers()[0];
    let delta = hidden.calc_delta(&[-1.0, 0.5, 0.5], net.layers()[1].weights());
    // zero pre-activation: ReLU gradient is 0 at the boundary
    assert_eq!(delta, vec![0.0; 5]);
}
