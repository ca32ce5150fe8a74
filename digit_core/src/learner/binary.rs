//! One-vs-rest logistic regression head.
//!
//! Weight vectors have length `D + 1` with the bias first. The bias column
//! is never materialised: `score = w[0] + x · w[1..]` is the same product as
//! prepending a constant 1.0 feature to every row.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use super::classifier::argmax_rows;
use super::error::ModelError;
use super::objective::{check_params, ensure_finite, Evaluation, Objective};
use crate::data::binary_labels;

/// Probabilities are clamped into `[PROB_EPSILON, 1 - PROB_EPSILON]` before
/// taking a logarithm.
pub const PROB_EPSILON: f64 = 1e-15;

/// Logistic function, evaluated without overflowing `exp` for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `w[0] + data · w[1..]` for every row
pub(crate) fn linear_scores(weights: ArrayView1<f64>, data: ArrayView2<f64>) -> Array1<f64> {
    data.dot(&weights.slice(s![1..])) + weights[0]
}

/// Mean negative log-likelihood and its gradient for one binary classifier.
///
/// `labels` holds 0.0/1.0 targets aligned with the rows of `data`.
pub fn binary_objective(
    weights: &Array1<f64>,
    data: ArrayView2<f64>,
    labels: &Array1<f64>,
) -> Result<(f64, Array1<f64>), ModelError> {
    const CONTEXT: &str = "binary objective";

    check_params(weights, data.ncols() + 1, CONTEXT)?;
    if labels.len() != data.nrows() {
        return Err(ModelError::shape(CONTEXT, data.nrows(), labels.len()));
    }
    if data.nrows() == 0 {
        return Err(ModelError::EmptyInput(CONTEXT.into()));
    }

    let n = data.nrows() as f64;
    let probs = linear_scores(weights.view(), data).mapv(sigmoid);

    let log_likelihood: f64 = probs
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum();
    let loss = -log_likelihood / n;

    let residual = &probs - labels;
    let mut gradient = Array1::zeros(weights.len());
    gradient[0] = residual.sum() / n;
    gradient
        .slice_mut(s![1..])
        .assign(&(data.t().dot(&residual) / n));

    ensure_finite(loss, &gradient, CONTEXT)?;
    Ok((loss, gradient))
}

/// Label each row with the class whose classifier gives the highest
/// posterior. Ties go to the lowest class index.
pub fn predict_one_vs_rest(
    weights: &[Array1<f64>],
    data: ArrayView2<f64>,
) -> Result<Array1<usize>, ModelError> {
    const CONTEXT: &str = "one-vs-rest prediction";

    if weights.is_empty() {
        return Err(ModelError::EmptyInput(format!("{CONTEXT}: no classifiers")));
    }

    let mut posteriors = Array2::zeros((data.nrows(), weights.len()));
    for (class, w) in weights.iter().enumerate() {
        check_params(w, data.ncols() + 1, CONTEXT)?;
        posteriors
            .column_mut(class)
            .assign(&linear_scores(w.view(), data).mapv(sigmoid));
    }

    Ok(argmax_rows(&posteriors))
}

/// Objective for the classifier of a single class against all others
#[derive(Debug, Clone)]
pub struct BinaryLogistic<'a> {
    data: ArrayView2<'a, f64>,
    labels: Array1<f64>,
}

impl<'a> BinaryLogistic<'a> {
    pub fn new(data: ArrayView2<'a, f64>, labels: Array1<f64>) -> Result<Self, ModelError> {
        if labels.len() != data.nrows() {
            return Err(ModelError::shape(
                "binary logistic labels",
                data.nrows(),
                labels.len(),
            ));
        }
        Ok(Self { data, labels })
    }

    /// Targets are 1.0 for rows labeled `class` and 0.0 for the rest
    pub fn for_class(
        data: ArrayView2<'a, f64>,
        labels: &Array1<usize>,
        class: usize,
    ) -> Result<Self, ModelError> {
        Self::new(data, binary_labels(labels, class))
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }
}

impl Objective for BinaryLogistic<'_> {
    fn num_params(&self) -> usize {
        self.data.ncols() + 1
    }

    fn evaluate(&self, params: &Array1<f64>) -> Result<Evaluation, ModelError> {
        let (loss, gradient) = binary_objective(params, self.data, &self.labels)?;
        Ok(Evaluation { loss, gradient })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_zero_weights_give_ln2() {
        let data = array![[0.3, 0.9, 0.0], [1.0, 0.2, 0.5], [0.0, 0.0, 0.7]];
        let labels = array![1.0, 0.0, 1.0];
        let (loss, _) = binary_objective(&Array1::zeros(4), data.view(), &labels).unwrap();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let data = array![[0.1, 0.8], [0.6, 0.2], [0.9, 0.9], [0.3, 0.4]];
        let labels = array![0.0, 1.0, 1.0, 0.0];
        let weights = array![0.2, -0.7, 1.3];
        let (_, gradient) = binary_objective(&weights, data.view(), &labels).unwrap();

        let h = 1e-6;
        for i in 0..weights.len() {
            let mut plus = weights.clone();
            let mut minus = weights.clone();
            plus[i] += h;
            minus[i] -= h;
            let (lp, _) = binary_objective(&plus, data.view(), &labels).unwrap();
            let (lm, _) = binary_objective(&minus, data.view(), &labels).unwrap();
            let numeric = (lp - lm) / (2.0 * h);
            assert!(
                (numeric - gradient[i]).abs() < 1e-6,
                "component {i}: analytic {} numeric {numeric}",
                gradient[i]
            );
        }
    }

    #[test]
    fn test_saturated_scores_stay_finite() {
        let data = array![[1.0], [1.0]];
        let labels = array![0.0, 1.0];
        let (loss, gradient) =
            binary_objective(&array![0.0, 5000.0], data.view(), &labels).unwrap();
        assert!(loss.is_finite());
        assert!(gradient.iter().all(|g| g.is_finite()));
        // clamped at 1 - 1e-15, so the wrong row costs about -ln(1e-15) / 2
        assert!(loss > 15.0);
    }

    #[test]
    fn test_objective_rejects_wrong_length() {
        let data = array![[1.0, 2.0]];
        let err = binary_objective(&array![0.0, 0.0], data.view(), &array![1.0]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_predict_picks_highest_posterior() {
        let data = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let weights = vec![array![0.0, 3.0, -3.0], array![0.0, -3.0, 3.0]];
        let labels = predict_one_vs_rest(&weights, data.view()).unwrap();
        // third row ties at 0.5, lowest index wins
        assert_eq!(labels, array![0, 1, 0]);
    }

    #[test]
    fn test_predict_labels_in_range() {
        let data = array![[0.2, 0.4], [0.9, 0.1], [0.5, 0.5], [0.0, 1.0]];
        let weights: Vec<Array1<f64>> = (0..10)
            .map(|k| array![k as f64 * 0.1 - 0.5, (k as f64).sin(), (k as f64).cos()])
            .collect();
        let labels = predict_one_vs_rest(&weights, data.view()).unwrap();
        assert_eq!(labels.len(), data.nrows());
        assert!(labels.iter().all(|&label| label < 10));
    }

    #[test]
    fn test_for_class_encodes_targets() {
        let data = array![[0.0], [1.0], [2.0]];
        let objective = BinaryLogistic::for_class(data.view(), &array![2, 0, 2], 2).unwrap();
        assert_eq!(objective.labels(), &array![1.0, 0.0, 1.0]);
        assert_eq!(objective.num_params(), 2);
    }
}
