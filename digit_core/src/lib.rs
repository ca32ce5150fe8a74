//! # Digit Recognition Core
//!
//! A deterministic Rust engine that classifies handwritten digits with linear
//! models. Raw per-digit intensity pools are split into train, validation and
//! test partitions, constant pixels are dropped, and two heads are fitted by
//! gradient-based minimization: K independent one-vs-rest logistic
//! classifiers, or a single multinomial (softmax) classifier.
//!
//! ## Quick Start
//!
//! ```rust
//! use digit_recognition_core::{
//!     generate_pools, Driver, EngineConfig, PrepareConfig, SyntheticConfig, TrainingMode,
//! };
//!
//! let pools = generate_pools(&SyntheticConfig {
//!     num_classes: 3,
//!     train_per_class: 60,
//!     test_per_class: 20,
//!     ..Default::default()
//! });
//! let config = EngineConfig {
//!     data: PrepareConfig {
//!         num_classes: 3,
//!         validation_per_class: 20,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! let driver = Driver::from_pools(&pools, config).unwrap();
//! let run = driver.run(TrainingMode::Multinomial).unwrap();
//! println!("Test accuracy: {:.2}%", run.evaluation.test_accuracy);
//! ```
//!
//! ## Core Modules
//!
//! - [`data`] - Pool loading, preparation and label encodings
//! - [`learner`] - Logistic objectives, classifier heads and trainers
//! - [`optim`] - Conjugate-gradient and momentum minimizers
//! - [`driver`] - End-to-end train and score runs
//! - [`config`] - Engine configuration via TOML
//! - [`logging`] - JSON line-delimited run journals

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod driver;
pub mod learner;
pub mod logging;
pub mod metrics;
pub mod optim;

pub use checkpoint::{CheckpointError, CheckpointHeader, Checkpointable};
pub use config::{ConfigError, EngineConfig, OutputConfig};
pub use data::{
    binary_labels, generate_pools, one_hot, prepare, DataError, DigitPools, FeatureMask,
    Partition, PrepareConfig, PreparedDataset, SyntheticConfig,
};
pub use driver::{Driver, DriverError, EvaluationReport, ModelRun};
pub use learner::{
    binary_objective, multinomial_objective, predict_multinomial, predict_one_vs_rest, sigmoid,
    softmax_rows, train, train_multinomial, train_one_vs_rest, BinaryLogistic, Classifier,
    Evaluation, ModelError, MultinomialLogistic, Objective, TrainError, TrainingConfig,
    TrainingMode, TrainingResult,
};
pub use metrics::{accuracy_percent, ConfusionMatrix};
pub use optim::{
    ConjugateGradient, Minimizer, MomentumDescent, OptimizationReport, OptimizeError,
    OptimizerConfig,
};
