//! Train both digit classifiers and report accuracy per partition.
//!
//! Usage:
//! ```text
//! cargo run --release --example train_digits -- --data-dir data/digits
//! cargo run --release --example train_digits -- --synthetic --config config/engine.toml
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use digit_recognition_core::{
    generate_pools, DigitPools, Driver, EngineConfig, SyntheticConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Train one-vs-rest and multinomial digit classifiers")]
struct Args {
    /// Directory holding train0.csv..train9.csv and test0.csv..test9.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use generated digit pools instead of CSV files
    #[arg(long)]
    synthetic: bool,

    /// Seed for the generated pools
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let pools = match (&args.data_dir, args.synthetic) {
        (Some(dir), false) => DigitPools::load_from_dir(dir, config.data.num_classes)
            .with_context(|| format!("loading digit pools from {}", dir.display()))?,
        (None, true) => generate_pools(&SyntheticConfig {
            num_classes: config.data.num_classes,
            train_per_class: config.data.validation_per_class + 500,
            seed: args.seed,
            ..Default::default()
        }),
        _ => bail!("pass exactly one of --data-dir or --synthetic"),
    };

    println!("Digit Recognition - Logistic Regression");
    println!("=======================================\n");

    let driver = Driver::from_pools(&pools, config)?;
    let dataset = driver.dataset();
    println!("Training samples:   {}", dataset.train.len());
    println!("Validation samples: {}", dataset.validation.len());
    println!("Test samples:       {}", dataset.test.len());
    println!(
        "Features kept:      {} of {}\n",
        dataset.num_features(),
        dataset.mask.raw_width()
    );

    for run in driver.run_all()? {
        let evaluation = &run.evaluation;
        println!("{} ({} ms)", evaluation.mode, evaluation.training_ms);
        println!("  Training set accuracy:   {:.2}%", evaluation.train_accuracy);
        println!("  Validation set accuracy: {:.2}%", evaluation.validation_accuracy);
        println!("  Testing set accuracy:    {:.2}%", evaluation.test_accuracy);

        println!("  Per-digit test recall:");
        for class in run.test_confusion.per_class_recall() {
            println!(
                "    {}: {:6.2}% ({} samples)",
                class.class, class.recall, class.support
            );
        }
        if let Some(path) = &run.checkpoint {
            println!("  Checkpoint: {}", path.display());
        }
        println!();
    }

    Ok(())
}
