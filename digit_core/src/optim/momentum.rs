//! Fixed-step gradient descent with momentum.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{check_start, Minimizer, Minimum, OptimizationReport, OptimizeError};
use crate::learner::Objective;

/// Gradient descent with a momentum term.
///
/// Implements the update rule:
/// ```text
/// velocity = momentum * velocity + learning_rate * gradient
/// parameter = parameter - velocity
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumDescent {
    /// Step size for parameter updates
    pub learning_rate: f64,
    /// Momentum coefficient (0.0 = plain gradient descent)
    pub momentum: f64,
    pub max_iters: u64,
    /// Stop once the gradient L2 norm falls to this value
    pub gradient_tolerance: f64,
}

impl Default for MomentumDescent {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            momentum: 0.9,
            max_iters: 100,
            gradient_tolerance: 1e-6,
        }
    }
}

impl MomentumDescent {
    /// # Examples
    ///
    /// ```
    /// use digit_recognition_core::optim::MomentumDescent;
    ///
    /// let descent = MomentumDescent::new(0.05, 0.9);
    /// assert_eq!(descent.max_iters, 100);
    /// ```
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(OptimizeError::InvalidConfig(
                "learning_rate must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(OptimizeError::InvalidConfig(
                "momentum must be in [0, 1)".into(),
            ));
        }
        if self.max_iters == 0 {
            return Err(OptimizeError::InvalidConfig(
                "max_iters must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn step(&self, params: &mut Array1<f64>, velocity: &mut Array1<f64>, gradient: &Array1<f64>) {
        velocity.mapv_inplace(|v| v * self.momentum);
        velocity.scaled_add(self.learning_rate, gradient);
        *params -= &*velocity;
    }
}

impl Minimizer for MomentumDescent {
    fn name(&self) -> &str {
        "momentum"
    }

    fn minimize<O: Objective>(
        &self,
        objective: &O,
        init: Array1<f64>,
    ) -> Result<Minimum, OptimizeError> {
        self.validate()?;
        check_start(objective, &init)?;

        let mut params = init;
        let mut velocity = Array1::zeros(params.len());
        let initial_loss = objective.loss(&params)?;
        let mut best = (params.clone(), initial_loss);
        let mut termination = String::from("max iterations reached");
        let mut iterations = 0;
        let mut evaluations = 1;

        while iterations < self.max_iters {
            let evaluation = objective.evaluate(&params)?;
            evaluations += 1;
            if evaluation.loss < best.1 {
                best = (params.clone(), evaluation.loss);
            }
            if evaluation.gradient.dot(&evaluation.gradient).sqrt() <= self.gradient_tolerance {
                termination = String::from("gradient below tolerance");
                break;
            }
            self.step(&mut params, &mut velocity, &evaluation.gradient);
            iterations += 1;
        }

        if iterations == self.max_iters {
            let loss = objective.loss(&params)?;
            evaluations += 1;
            if loss < best.1 {
                best = (params, loss);
            }
        }

        let (params, final_loss) = best;
        Ok(Minimum {
            params,
            report: OptimizationReport {
                initial_loss,
                final_loss,
                iterations,
                evaluations,
                termination,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::{Evaluation, ModelError};
    use ndarray::array;

    /// `f(x) = Σ (x_i - c_i)^2`
    struct Quadratic {
        center: Array1<f64>,
    }

    impl Objective for Quadratic {
        fn num_params(&self) -> usize {
            self.center.len()
        }

        fn evaluate(&self, params: &Array1<f64>) -> Result<Evaluation, ModelError> {
            let diff = params - &self.center;
            Ok(Evaluation {
                loss: diff.dot(&diff),
                gradient: diff * 2.0,
            })
        }
    }

    #[test]
    fn test_descent_reaches_quadratic_minimum() {
        let objective = Quadratic {
            center: array![1.0, -2.0, 0.5],
        };
        let descent = MomentumDescent {
            learning_rate: 0.1,
            momentum: 0.5,
            max_iters: 500,
            gradient_tolerance: 1e-9,
        };
        let minimum = descent.minimize(&objective, objective.zero_params()).unwrap();

        assert!(minimum.report.final_loss < 1e-12);
        assert!(minimum.report.final_loss <= minimum.report.initial_loss);
        assert_eq!(minimum.report.termination, "gradient below tolerance");
        assert!((minimum.params[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_divergent_step_keeps_best_iterate() {
        let objective = Quadratic {
            center: array![1.0],
        };
        // lr 1.5 overshoots further every step
        let descent = MomentumDescent {
            learning_rate: 1.5,
            momentum: 0.0,
            max_iters: 10,
            gradient_tolerance: 0.0,
        };
        let minimum = descent.minimize(&objective, array![0.0]).unwrap();
        assert_eq!(minimum.report.final_loss, minimum.report.initial_loss);
        assert_eq!(minimum.params, array![0.0]);
        assert_eq!(minimum.report.iterations, 10);
    }

    #[test]
    fn test_rejects_invalid_momentum() {
        let descent = MomentumDescent::new(0.1, 1.0);
        assert!(matches!(
            descent.validate(),
            Err(OptimizeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_start_length() {
        let objective = Quadratic {
            center: array![1.0, 1.0],
        };
        let err = MomentumDescent::default()
            .minimize(&objective, array![0.0])
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Objective(_)));
    }
}
