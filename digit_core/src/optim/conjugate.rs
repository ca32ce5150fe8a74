//! Nonlinear conjugate gradient backed by `argmin`.
//!
//! The objective is wrapped in an adapter that implements `argmin`'s
//! [`CostFunction`] and [`Gradient`] on top of a single [`Objective::evaluate`]
//! call. `argmin` asks for cost and gradient separately at the same point, so
//! the adapter caches the last evaluation. It also records the lowest-loss
//! point seen, which is where the solver restarts after the line search
//! rejects a direction and what gets returned at the end.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use argmin::core::observers::{Observe, ObserverMode};
use argmin::core::{CostFunction, Error as ArgminError, Executor, Gradient, State, KV};
use argmin::solver::conjugategradient::{beta::PolakRibierePlus, NonlinearConjugateGradient};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{check_start, Minimizer, Minimum, OptimizationReport, OptimizeError};
use crate::learner::{Evaluation, ModelError, Objective};

/// Flat parameter vector
pub type Params = Array1<f64>;
/// Gradient with the same layout as [`Params`]
pub type Grad = Array1<f64>;

type MoreThuente = MoreThuenteLineSearch<Params, Grad, f64>;
type PolakRibierePlusCg = NonlinearConjugateGradient<Params, MoreThuente, PolakRibierePlus, f64>;

/// Polak-Ribière (non-negative β) conjugate gradient with a More-Thuente
/// line search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConjugateGradient {
    /// Iteration cap; reaching it is not an error
    pub max_iters: u64,
    /// Reset the search direction to steepest descent every n iterations
    pub restart_iters: u64,
    /// Sufficient-decrease constant of the line search
    pub c1: f64,
    /// Curvature constant of the line search
    pub c2: f64,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self {
            max_iters: 100,
            restart_iters: 10,
            c1: 1e-4,
            c2: 0.4,
        }
    }
}

impl ConjugateGradient {
    pub fn with_max_iters(max_iters: u64) -> Self {
        Self {
            max_iters,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.max_iters == 0 {
            return Err(OptimizeError::InvalidConfig(
                "max_iters must be at least 1".into(),
            ));
        }
        if self.restart_iters == 0 {
            return Err(OptimizeError::InvalidConfig(
                "restart_iters must be at least 1".into(),
            ));
        }
        if !(0.0 < self.c1 && self.c1 < self.c2 && self.c2 < 1.0) {
            return Err(OptimizeError::InvalidConfig(format!(
                "line search constants must satisfy 0 < c1 < c2 < 1 (got c1 = {}, c2 = {})",
                self.c1, self.c2
            )));
        }
        Ok(())
    }

    fn solver(&self) -> Result<PolakRibierePlusCg, OptimizeError> {
        let linesearch = MoreThuente::new()
            .with_c(self.c1, self.c2)
            .map_err(|err| OptimizeError::InvalidConfig(err.to_string()))?;
        Ok(NonlinearConjugateGradient::new(linesearch, PolakRibierePlus::new())
            .restart_iters(self.restart_iters))
    }
}

/// Lowest-loss point evaluated so far, with its gradient
#[derive(Debug)]
struct BestPoint {
    params: Params,
    evaluation: Evaluation,
    evaluations: u64,
}

struct ArgminProblem<'a, O> {
    objective: &'a O,
    last: RefCell<Option<(Params, Evaluation)>>,
    best: &'a RefCell<BestPoint>,
}

impl<'a, O: Objective> ArgminProblem<'a, O> {
    /// The cache starts at the current best point, which is where each run begins.
    fn new(objective: &'a O, best: &'a RefCell<BestPoint>) -> Self {
        let seed = {
            let best = best.borrow();
            (best.params.clone(), best.evaluation.clone())
        };
        Self {
            objective,
            last: RefCell::new(Some(seed)),
            best,
        }
    }

    fn evaluate(&self, params: &Params) -> Result<Evaluation, ModelError> {
        if let Some((cached, evaluation)) = self.last.borrow().as_ref() {
            if cached == params {
                return Ok(evaluation.clone());
            }
        }

        let evaluation = self.objective.evaluate(params)?;
        {
            let mut best = self.best.borrow_mut();
            best.evaluations += 1;
            if evaluation.loss < best.evaluation.loss {
                best.params = params.clone();
                best.evaluation = evaluation.clone();
            }
        }
        *self.last.borrow_mut() = Some((params.clone(), evaluation.clone()));
        Ok(evaluation)
    }
}

impl<O: Objective> CostFunction for ArgminProblem<'_, O> {
    type Param = Params;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        Ok(self.evaluate(param)?.loss)
    }
}

impl<O: Objective> Gradient for ArgminProblem<'_, O> {
    type Param = Params;
    type Gradient = Grad;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, ArgminError> {
        Ok(self.evaluate(param)?.gradient)
    }
}

/// Completed solver iterations, readable after a run that ended in an error
#[derive(Debug, Clone, Default)]
struct IterationCounter(Arc<AtomicU64>);

impl IterationCounter {
    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl<I> Observe<I> for IterationCounter {
    fn observe_iter(&mut self, _state: &I, _kv: &KV) -> Result<(), ArgminError> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Minimizer for ConjugateGradient {
    fn name(&self) -> &str {
        "conjugate_gradient"
    }

    /// Runs argmin from the best point found so far until the iteration
    /// budget is spent. When the line search rejects a direction, the next
    /// run restarts from the best point along steepest descent with the
    /// remaining budget. A failure along steepest descent itself ends the
    /// minimization.
    fn minimize<O: Objective>(
        &self,
        objective: &O,
        init: Array1<f64>,
    ) -> Result<Minimum, OptimizeError> {
        self.validate()?;
        check_start(objective, &init)?;

        let initial = objective.evaluate(&init)?;
        let initial_loss = initial.loss;
        let best = RefCell::new(BestPoint {
            params: init,
            evaluation: initial,
            evaluations: 1,
        });

        let mut iterations = 0;
        let mut restarts = 0;
        let termination = loop {
            // A zero gradient leaves the line search without a descent direction
            if best.borrow().evaluation.gradient.iter().all(|g| *g == 0.0) {
                break String::from("stationary point");
            }
            let remaining = self.max_iters - iterations;
            if remaining == 0 {
                break String::from("MaxItersReached");
            }

            let start = best.borrow().params.clone();
            let counter = IterationCounter::default();
            let outcome = Executor::new(ArgminProblem::new(objective, &best), self.solver()?)
                .configure(|state| state.param(start).max_iters(remaining))
                .add_observer(counter.clone(), ObserverMode::Always)
                .run();
            let completed = counter.get();
            iterations += completed;

            match outcome {
                Ok(result) => {
                    break result
                        .state()
                        .get_termination_reason()
                        .map(|reason| format!("{reason:?}"))
                        .unwrap_or_else(|| "not terminated".into());
                }
                Err(err) => {
                    let err = match err.downcast::<ModelError>() {
                        Ok(model_err) => return Err(OptimizeError::Objective(model_err)),
                        Err(err) => err,
                    };
                    if completed == 0 {
                        tracing::warn!(
                            "Line search failed along steepest descent after {iterations} iterations: {err}"
                        );
                        break format!("line search failed along steepest descent: {err}");
                    }
                    restarts += 1;
                    tracing::debug!(
                        "Restarting conjugate gradient from best point after {iterations} iterations: {err}"
                    );
                }
            }
        };

        if restarts > 0 {
            tracing::debug!("Conjugate gradient restarted {restarts} times");
        }

        let best = best.into_inner();
        Ok(Minimum {
            params: best.params,
            report: OptimizationReport {
                initial_loss,
                final_loss: best.evaluation.loss,
                iterations,
                evaluations: best.evaluations,
                termination,
            },
        })
    }
}
