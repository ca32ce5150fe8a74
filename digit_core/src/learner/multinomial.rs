//! Jointly trained softmax (multinomial logistic) head.
//!
//! The weight matrix is `(D + 1) × K` with the bias row first. The flat
//! parameter vector handed to minimizers is its row-major flattening.

use ndarray::{s, Array1, Array2, ArrayView2, Axis};

use super::classifier::argmax_rows;
use super::error::ModelError;
use super::objective::{check_params, ensure_finite, Evaluation, Objective};
use crate::data::one_hot;

/// `bias_row + data · W[1..]`, one row of class scores per sample
fn class_scores(weights: ArrayView2<f64>, data: ArrayView2<f64>) -> Array2<f64> {
    data.dot(&weights.slice(s![1.., ..])) + &weights.row(0)
}

/// Row-wise softmax with the row maximum subtracted before `exp`.
pub fn softmax_rows(scores: &Array2<f64>) -> Array2<f64> {
    let mut probs = scores.clone();
    for mut row in probs.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &z| acc.max(z));
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    probs
}

/// Row-wise `z - max - ln Σ exp(z - max)`, the logarithm of [`softmax_rows`]
/// without ever evaluating `ln 0`.
fn log_softmax_rows(mut scores: Array2<f64>) -> Array2<f64> {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &z| acc.max(z));
        let log_sum = row.iter().map(|&z| (z - max).exp()).sum::<f64>().ln();
        row.mapv_inplace(|z| z - max - log_sum);
    }
    scores
}

/// Mean cross-entropy and its `(D + 1) × K` gradient.
pub fn multinomial_objective(
    weights: ArrayView2<f64>,
    data: ArrayView2<f64>,
    one_hot: &Array2<f64>,
) -> Result<(f64, Array2<f64>), ModelError> {
    const CONTEXT: &str = "multinomial objective";

    let expected = (data.ncols() + 1, one_hot.ncols());
    if weights.dim() != expected {
        return Err(ModelError::shape(
            CONTEXT,
            format!("{:?}", expected),
            format!("{:?}", weights.dim()),
        ));
    }
    if one_hot.nrows() != data.nrows() {
        return Err(ModelError::shape(CONTEXT, data.nrows(), one_hot.nrows()));
    }
    if data.nrows() == 0 {
        return Err(ModelError::EmptyInput(CONTEXT.into()));
    }

    let n = data.nrows() as f64;
    let log_probs = log_softmax_rows(class_scores(weights, data));
    let loss = -(&log_probs * one_hot).sum() / n;

    let residual = log_probs.mapv(f64::exp) - one_hot;
    let mut gradient = Array2::zeros(weights.dim());
    gradient
        .row_mut(0)
        .assign(&(residual.sum_axis(Axis(0)) / n));
    gradient
        .slice_mut(s![1.., ..])
        .assign(&(data.t().dot(&residual) / n));

    ensure_finite(loss, &gradient, CONTEXT)?;
    Ok((loss, gradient))
}

/// Label each row with its most probable class. Ties go to the lowest index.
pub fn predict_multinomial(
    weights: &Array2<f64>,
    data: ArrayView2<f64>,
) -> Result<Array1<usize>, ModelError> {
    if weights.nrows() != data.ncols() + 1 {
        return Err(ModelError::shape(
            "multinomial prediction",
            format!("{} weight rows", data.ncols() + 1),
            format!("{} weight rows", weights.nrows()),
        ));
    }
    if weights.ncols() == 0 {
        return Err(ModelError::EmptyInput(
            "multinomial prediction: no classes".into(),
        ));
    }

    let probs = softmax_rows(&class_scores(weights.view(), data));
    Ok(argmax_rows(&probs))
}

/// Reshape a flat row-major parameter vector into the `(D + 1) × K` matrix.
pub fn weights_from_params(
    params: &Array1<f64>,
    num_features: usize,
    num_classes: usize,
) -> Result<Array2<f64>, ModelError> {
    check_params(params, (num_features + 1) * num_classes, "weight reshape")?;
    params
        .to_owned()
        .into_shape((num_features + 1, num_classes))
        .map_err(|err| ModelError::shape("weight reshape", "row-major layout", err))
}

/// Objective over all classes at once
#[derive(Debug, Clone)]
pub struct MultinomialLogistic<'a> {
    data: ArrayView2<'a, f64>,
    one_hot: Array2<f64>,
}

impl<'a> MultinomialLogistic<'a> {
    pub fn new(data: ArrayView2<'a, f64>, one_hot: Array2<f64>) -> Result<Self, ModelError> {
        if one_hot.nrows() != data.nrows() {
            return Err(ModelError::shape(
                "multinomial one-hot labels",
                data.nrows(),
                one_hot.nrows(),
            ));
        }
        Ok(Self { data, one_hot })
    }

    pub fn from_labels(
        data: ArrayView2<'a, f64>,
        labels: &Array1<usize>,
        num_classes: usize,
    ) -> Result<Self, ModelError> {
        Self::new(data, one_hot(labels, num_classes))
    }

    pub fn num_classes(&self) -> usize {
        self.one_hot.ncols()
    }

    pub fn num_features(&self) -> usize {
        self.data.ncols()
    }
}

impl Objective for MultinomialLogistic<'_> {
    fn num_params(&self) -> usize {
        (self.data.ncols() + 1) * self.one_hot.ncols()
    }

    fn evaluate(&self, params: &Array1<f64>) -> Result<Evaluation, ModelError> {
        let weights = weights_from_params(params, self.num_features(), self.num_classes())?;
        let (loss, gradient) = multinomial_objective(weights.view(), self.data, &self.one_hot)?;
        Ok(Evaluation {
            loss,
            gradient: gradient.iter().copied().collect(),
        })
    }
}
