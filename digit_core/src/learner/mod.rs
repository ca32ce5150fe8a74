//! Logistic-regression objectives, the two classifier heads and their trainers.
//!
//! Parameter layout: the bias weight comes first, followed by one weight per
//! feature. The multinomial head stores a `(D + 1) × K` matrix and flattens it
//! row-major for the minimizers.

pub mod binary;
pub mod classifier;
pub mod error;
pub mod multinomial;
pub mod objective;
pub mod training;

pub use binary::{binary_objective, predict_one_vs_rest, sigmoid, BinaryLogistic, PROB_EPSILON};
pub use classifier::{Classifier, TrainingMode};
pub use error::ModelError;
pub use multinomial::{
    multinomial_objective, predict_multinomial, softmax_rows, weights_from_params,
    MultinomialLogistic,
};
pub use objective::{Evaluation, Objective};
pub use training::{
    train, train_multinomial, train_one_vs_rest, TrainError, TrainingConfig, TrainingResult,
};
