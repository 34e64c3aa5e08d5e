//! Loss functions for training neural networks.

/// Categorical cross-entropy `-sum_i target[i] * ln(output[i])`.
///
/// Unguarded: a zero probability under a non-zero target yields `inf`.
pub fn cross_entropy_loss(output: &[f64], target: &[f64]) -> f64 {
    -output
        .iter()
        .zip(target)
        .map(|(&p, &t)| t * p.ln())
        .sum::<f64>()
}

/// Output-layer delta for softmax + cross-entropy: `output - target`.
///
/// This is the combined derivative of both; it is wrong for any other
/// output activation or loss.
pub fn softmax_cross_entropy_delta(output: &[f64], target: &[f64]) -> Vec<f64> {
    output.iter().zip(target).map(|(&p, &t)| p - t).collect()
}
