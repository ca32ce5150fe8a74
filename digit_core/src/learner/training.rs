//! Fitting the one-vs-rest and multinomial heads.
//!
//! One-vs-rest runs one minimization per class. The classes are independent
//! and share the training matrix read-only, so with `parallel` set they are
//! fitted on the rayon pool. Reports always come back in class order.

use std::time::Instant;

use ndarray::{Array1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::binary::BinaryLogistic;
use super::classifier::{Classifier, TrainingMode};
use super::error::ModelError;
use super::multinomial::{weights_from_params, MultinomialLogistic};
use super::objective::Objective;
use crate::optim::{Minimizer, OptimizationReport, OptimizeError, OptimizerConfig};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of classes K
    pub num_classes: usize,
    /// Fit one-vs-rest classes on the rayon pool
    pub parallel: bool,
    pub optimizer: OptimizerConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_classes: 10,
            parallel: false,
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// Complete training result
#[derive(Debug, Clone)]
pub struct TrainingResult {
    pub classifier: Classifier,
    /// One report per minimization (K for one-vs-rest, 1 for multinomial)
    pub reports: Vec<OptimizationReport>,
    pub elapsed_ms: u128,
}

impl TrainingResult {
    pub fn mode(&self) -> TrainingMode {
        self.classifier.mode()
    }

    /// Sum of final losses across all minimizations
    pub fn total_final_loss(&self) -> f64 {
        self.reports.iter().map(|report| report.final_loss).sum()
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Optimization failed for {head}: {source}")]
    Optimize {
        head: String,
        #[source]
        source: OptimizeError,
    },
}

fn check_inputs(
    data: &ArrayView2<f64>,
    labels: &Array1<usize>,
    num_classes: usize,
) -> Result<(), ModelError> {
    if data.nrows() == 0 {
        return Err(ModelError::EmptyInput("training matrix has no rows".into()));
    }
    if num_classes == 0 {
        return Err(ModelError::EmptyInput("no classes to train".into()));
    }
    if labels.len() != data.nrows() {
        return Err(ModelError::shape(
            "training labels",
            format!("{} labels", data.nrows()),
            format!("{} labels", labels.len()),
        ));
    }
    if let Some(label) = labels.iter().find(|&&label| label >= num_classes) {
        return Err(ModelError::shape(
            "training labels",
            format!("labels below {num_classes}"),
            format!("label {label}"),
        ));
    }
    Ok(())
}

fn fit_class(
    data: ArrayView2<f64>,
    labels: &Array1<usize>,
    class: usize,
    optimizer: &OptimizerConfig,
) -> Result<(Array1<f64>, OptimizationReport), TrainError> {
    let objective = BinaryLogistic::for_class(data, labels, class)?;
    let minimum = optimizer
        .minimize(&objective, objective.zero_params())
        .map_err(|source| TrainError::Optimize {
            head: format!("digit {class}"),
            source,
        })?;

    tracing::debug!(
        "Digit {} fitted: loss {:.4} -> {:.4} in {} iterations ({})",
        class,
        minimum.report.initial_loss,
        minimum.report.final_loss,
        minimum.report.iterations,
        minimum.report.termination
    );

    Ok((minimum.params, minimum.report))
}

/// Fit K independent binary classifiers, one per class.
pub fn train_one_vs_rest(
    data: ArrayView2<f64>,
    labels: &Array1<usize>,
    config: &TrainingConfig,
) -> Result<TrainingResult, TrainError> {
    check_inputs(&data, labels, config.num_classes)?;
    let start_time = Instant::now();

    let fitted: Vec<(Array1<f64>, OptimizationReport)> = if config.parallel {
        (0..config.num_classes)
            .into_par_iter()
            .map(|class| fit_class(data, labels, class, &config.optimizer))
            .collect::<Result<_, _>>()?
    } else {
        (0..config.num_classes)
            .map(|class| fit_class(data, labels, class, &config.optimizer))
            .collect::<Result<_, _>>()?
    };

    let (weights, reports): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();
    let elapsed_ms = start_time.elapsed().as_millis();

    tracing::info!(
        "One-vs-rest training complete: {} classes, {} features, {} ms{}",
        config.num_classes,
        data.ncols(),
        elapsed_ms,
        if config.parallel { " (parallel)" } else { "" }
    );

    Ok(TrainingResult {
        classifier: Classifier::OneVsRest(weights),
        reports,
        elapsed_ms,
    })
}

/// Fit a single softmax classifier over all classes.
pub fn train_multinomial(
    data: ArrayView2<f64>,
    labels: &Array1<usize>,
    config: &TrainingConfig,
) -> Result<TrainingResult, TrainError> {
    check_inputs(&data, labels, config.num_classes)?;
    let start_time = Instant::now();

    let objective = MultinomialLogistic::from_labels(data, labels, config.num_classes)?;
    let minimum = config
        .optimizer
        .minimize(&objective, objective.zero_params())
        .map_err(|source| TrainError::Optimize {
            head: "multinomial".into(),
            source,
        })?;
    let weights = weights_from_params(&minimum.params, data.ncols(), config.num_classes)?;
    let elapsed_ms = start_time.elapsed().as_millis();

    tracing::info!(
        "Multinomial training complete: loss {:.4} -> {:.4} in {} iterations, {} ms",
        minimum.report.initial_loss,
        minimum.report.final_loss,
        minimum.report.iterations,
        elapsed_ms
    );

    Ok(TrainingResult {
        classifier: Classifier::Multinomial(weights),
        reports: vec![minimum.report],
        elapsed_ms,
    })
}

/// Train the head selected by `mode`.
pub fn train(
    mode: TrainingMode,
    data: ArrayView2<f64>,
    labels: &Array1<usize>,
    config: &TrainingConfig,
) -> Result<TrainingResult, TrainError> {
    match mode {
        TrainingMode::OneVsRest => train_one_vs_rest(data, labels, config),
        TrainingMode::Multinomial => train_multinomial(data, labels, config),
    }
}
