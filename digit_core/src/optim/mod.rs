//! Minimizers that drive an [`Objective`] from an all-zero start.
//!
//! Both minimizers return the best iterate they evaluated, so the reported
//! final loss never exceeds the loss at the starting point. Running out of
//! iterations is a normal outcome, not an error.

pub mod conjugate;
pub mod momentum;

pub use conjugate::ConjugateGradient;
pub use momentum::MomentumDescent;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::learner::{ModelError, Objective};

/// Summary of one minimizer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub initial_loss: f64,
    pub final_loss: f64,
    pub iterations: u64,
    /// Objective evaluations, including line-search trials
    pub evaluations: u64,
    /// Human-readable reason the run stopped
    pub termination: String,
}

/// Parameters returned by a minimizer together with its report
#[derive(Debug, Clone)]
pub struct Minimum {
    pub params: Array1<f64>,
    pub report: OptimizationReport,
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Objective evaluation failed: {0}")]
    Objective(#[from] ModelError),

    #[error("Solver failed: {0}")]
    Solver(String),

    #[error("Invalid optimizer configuration: {0}")]
    InvalidConfig(String),
}

/// An unconstrained minimizer over flat parameter vectors
pub trait Minimizer {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Minimize `objective` starting from `init`
    fn minimize<O: Objective>(
        &self,
        objective: &O,
        init: Array1<f64>,
    ) -> Result<Minimum, OptimizeError>;
}

/// Minimizer selection as it appears in the `[optimizer]` config table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OptimizerConfig {
    ConjugateGradient(ConjugateGradient),
    Momentum(MomentumDescent),
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::ConjugateGradient(ConjugateGradient::default())
    }
}

impl OptimizerConfig {
    pub fn max_iters(&self) -> u64 {
        match self {
            OptimizerConfig::ConjugateGradient(cg) => cg.max_iters,
            OptimizerConfig::Momentum(descent) => descent.max_iters,
        }
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        match self {
            OptimizerConfig::ConjugateGradient(cg) => cg.validate(),
            OptimizerConfig::Momentum(descent) => descent.validate(),
        }
    }
}

impl Minimizer for OptimizerConfig {
    fn name(&self) -> &str {
        match self {
            OptimizerConfig::ConjugateGradient(cg) => cg.name(),
            OptimizerConfig::Momentum(descent) => descent.name(),
        }
    }

    fn minimize<O: Objective>(
        &self,
        objective: &O,
        init: Array1<f64>,
    ) -> Result<Minimum, OptimizeError> {
        match self {
            OptimizerConfig::ConjugateGradient(cg) => cg.minimize(objective, init),
            OptimizerConfig::Momentum(descent) => descent.minimize(objective, init),
        }
    }
}

pub(crate) fn check_start<O: Objective>(objective: &O, init: &Array1<f64>) -> Result<(), OptimizeError> {
    if init.len() != objective.num_params() {
        return Err(OptimizeError::Objective(ModelError::ShapeMismatch {
            expected: format!("{} parameters", objective.num_params()),
            actual: format!("{} parameters", init.len()),
            context: "minimizer start".into(),
        }));
    }
    Ok(())
}
