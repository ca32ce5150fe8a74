//! Shared objective capability consumed by the minimizers.

use ndarray::Array1;

use super::error::ModelError;

/// Loss value and gradient at one parameter vector
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub gradient: Array1<f64>,
}

/// A differentiable loss over a flat parameter vector.
///
/// Implementations borrow their training data read-only, so one objective
/// can be evaluated from several threads at once.
pub trait Objective {
    /// Length of the flat parameter vector
    fn num_params(&self) -> usize;

    /// Loss and gradient at `params`
    fn evaluate(&self, params: &Array1<f64>) -> Result<Evaluation, ModelError>;

    fn loss(&self, params: &Array1<f64>) -> Result<f64, ModelError> {
        Ok(self.evaluate(params)?.loss)
    }

    /// All-zero starting point
    fn zero_params(&self) -> Array1<f64> {
        Array1::zeros(self.num_params())
    }
}

pub(crate) fn ensure_finite<'a, I>(loss: f64, gradient: I, context: &str) -> Result<(), ModelError>
where
    I: IntoIterator<Item = &'a f64>,
{
    if loss.is_finite() && gradient.into_iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite {
            context: context.to_string(),
        })
    }
}

pub(crate) fn check_params(params: &Array1<f64>, expected: usize, context: &str) -> Result<(), ModelError> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(ModelError::shape(
            context,
            format!("{expected} parameters"),
            format!("{} parameters", params.len()),
        ))
    }
}
