//! Utility functions for neural network training and evaluation.
use crate::datasets::InMemoryDataset;
use crate::network::Network;
use rand::Rng;
use tracing::info;

/// Random points in `[0, 1)^input_size`, labelled by which of `num_classes`
/// equal slices the first feature falls into. Linearly separable, so a
/// small network should learn it.
pub fn generate_synthetic_data<R: Rng>(
    rng: &mut R,
    n_samples: usize,
    input_size: usize,
    num_classes: usize,
) -> InMemoryDataset {
    let samples = (0..n_samples)
        .map(|_| {
            let input: Vec<f64> = (0..input_size).map(|_| rng.gen_range(0.0..1.0)).collect();
            let label = input
                .first()
                .map(|&x| ((x * num_classes as f64) as usize).min(num_classes.saturating_sub(1)))
                .unwrap_or(0);
            (input, label)
        })
        .collect();
    InMemoryDataset::new(samples, num_classes)
}

/// Log layer sizes and activations.
pub fn log_model_summary(net: &Network) {
    info!("{}", net);
    for (i, layer) in net.layers().iter().enumerate() {
        info!(
            layer = i,
            inputs = layer.input_size(),
            outputs = layer.output_size(),
            activation = %layer.activation(),
            "layer"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::LabeledDataset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn synthetic_labels_follow_first_feature() {
        let mut rng = StdRng::seed_from_u64(11);
        let set = generate_synthetic_data(&mut rng, 50, 3, 4);
        assert_eq!(set.len(), 50);
        for i in 0..set.len() {
            let x = set.input(i);
            assert_eq!(x.len(), 3);
            assert_eq!(set.label(i), (x[0] * 4.0) as usize);
        }
    }
}
