// ml_examples/src/main.rs
use anyhow::Result;
use clap::Parser;
use primitive_nn::datasets::{mnist_paths, MNIST_CLASSES};
use primitive_nn::{load_config, log_model_summary, MnistDataSet, Trainer, TrainingConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "classify_mnist")]
#[command(about = "Train a feedforward network on MNIST")]
struct Args {
    /// Directory holding the four MNIST IDX files (optionally .gz)
    #[arg(short, long, default_value = "mnist")]
    data_dir: PathBuf,

    /// JSON training configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Override the initial learning rate
    #[arg(short, long)]
    learning_rate: Option<f64>,

    /// Override the batch size
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Seed for weight initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Log per-layer deltas
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(lr) = args.learning_rate {
        config.learning_rate = lr;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.verbose |= args.verbose;
    config.validate()?;

    let (images, labels) = mnist_paths(&args.data_dir, true)?;
    let train_set = MnistDataSet::load(images, labels)?;
    let (images, labels) = mnist_paths(&args.data_dir, false)?;
    let test_set = MnistDataSet::load(images, labels)?;

    let mut net = config.build_network(train_set.image_size(), MNIST_CLASSES);
    log_model_summary(&net);

    let mut trainer = Trainer::new(config)?;
    let history = trainer.fit(&mut net, &train_set, Some(&test_set))?;
    if let Some(last) = history.last() {
        info!(
            train_error = last.train.error_rate(),
            test_error = ?last.test.map(|t| t.error_rate()),
            "finished"
        );
    }
    Ok(())
}
