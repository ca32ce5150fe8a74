//! Trained classifier artifacts
//!
//! A [`Classifier`] is the frozen result of one training run: either ten
//! independent one-vs-rest weight vectors or one jointly trained softmax
//! weight matrix.

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::binary::predict_one_vs_rest;
use super::error::ModelError;
use super::multinomial::predict_multinomial;

/// Which head a training run optimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// One binary classifier per class, each optimized separately
    OneVsRest,
    /// A single softmax classifier optimized jointly
    Multinomial,
}

impl TrainingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingMode::OneVsRest => "one_vs_rest",
            TrainingMode::Multinomial => "multinomial",
        }
    }

    pub fn all() -> [TrainingMode; 2] {
        [TrainingMode::OneVsRest, TrainingMode::Multinomial]
    }
}

impl std::fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frozen weights for one of the two heads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    /// Weight vector of length `D + 1` per class, indexed by class id
    OneVsRest(Vec<Array1<f64>>),
    /// `(D + 1) × K` weight matrix, bias row first
    Multinomial(Array2<f64>),
}

impl Classifier {
    pub fn mode(&self) -> TrainingMode {
        match self {
            Classifier::OneVsRest(_) => TrainingMode::OneVsRest,
            Classifier::Multinomial(_) => TrainingMode::Multinomial,
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            Classifier::OneVsRest(weights) => weights.len(),
            Classifier::Multinomial(weights) => weights.ncols(),
        }
    }

    /// Feature count `D`, excluding the bias
    pub fn num_features(&self) -> usize {
        let rows = match self {
            Classifier::OneVsRest(weights) => weights.first().map_or(0, |w| w.len()),
            Classifier::Multinomial(weights) => weights.nrows(),
        };
        rows.saturating_sub(1)
    }

    /// Predicted label for every row of `data`
    pub fn predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>, ModelError> {
        match self {
            Classifier::OneVsRest(weights) => predict_one_vs_rest(weights, data),
            Classifier::Multinomial(weights) => predict_multinomial(weights, data),
        }
    }

    /// Check that every one-vs-rest vector has the same non-zero length and
    /// that the multinomial matrix has a bias row and at least one class.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Classifier::OneVsRest(weights) => {
                let Some(first) = weights.first() else {
                    return Err(ModelError::EmptyInput("one-vs-rest classifier has no classes".into()));
                };
                if first.is_empty() {
                    return Err(ModelError::EmptyInput("one-vs-rest weights have no bias".into()));
                }
                if let Some((class, w)) = weights
                    .iter()
                    .enumerate()
                    .find(|(_, w)| w.len() != first.len())
                {
                    return Err(ModelError::shape(
                        "one-vs-rest weights",
                        format!("{} weights for every class", first.len()),
                        format!("{} weights for class {class}", w.len()),
                    ));
                }
                Ok(())
            }
            Classifier::Multinomial(weights) => {
                if weights.nrows() == 0 || weights.ncols() == 0 {
                    return Err(ModelError::EmptyInput(format!(
                        "multinomial weights have shape {:?}",
                        weights.dim()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Weights as a `(D + 1) × K` matrix with one column per class
    pub fn weight_matrix(&self) -> Result<Array2<f64>, ModelError> {
        self.validate()?;
        match self {
            Classifier::OneVsRest(weights) => {
                let mut matrix = Array2::zeros((self.num_features() + 1, weights.len()));
                for (class, w) in weights.iter().enumerate() {
                    matrix.column_mut(class).assign(w);
                }
                Ok(matrix)
            }
            Classifier::Multinomial(weights) => Ok(weights.clone()),
        }
    }
}

/// Column index of each row's maximum; the first maximum wins.
pub(crate) fn argmax_rows(scores: &Array2<f64>) -> Array1<usize> {
    scores
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_val = f64::NEG_INFINITY;
            for (idx, &value) in row.iter().enumerate() {
                if value > best_val {
                    best_val = value;
                    best = idx;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        let scores = array![[0.2, 0.7, 0.7], [0.5, 0.5, 0.1], [0.0, 0.0, 0.9]];
        assert_eq!(argmax_rows(&scores), array![1, 0, 2]);
    }

    #[test]
    fn test_weight_matrix_columns_follow_classes() {
        let classifier = Classifier::OneVsRest(vec![array![1.0, 2.0], array![3.0, 4.0]]);
        assert_eq!(
            classifier.weight_matrix().unwrap(),
            array![[1.0, 3.0], [2.0, 4.0]]
        );
        assert_eq!(classifier.num_features(), 1);
        assert_eq!(classifier.num_classes(), 2);
        assert_eq!(classifier.mode(), TrainingMode::OneVsRest);
    }

    #[test]
    fn test_heads_agree_on_equivalent_weights() {
        // with two classes and antisymmetric weights both rules pick the same side
        let data = array![[0.9, 0.1], [0.1, 0.9], [0.6, 0.3]];
        let ovr = Classifier::OneVsRest(vec![array![0.0, 1.0, -1.0], array![0.0, -1.0, 1.0]]);
        let joint = Classifier::Multinomial(ovr.weight_matrix().unwrap());
        assert_eq!(
            ovr.predict(data.view()).unwrap(),
            joint.predict(data.view()).unwrap()
        );
    }

    #[test]
    fn test_ragged_one_vs_rest_weights_are_rejected() {
        let ragged = Classifier::OneVsRest(vec![array![0.0, 1.0], array![0.0, 1.0, 2.0]]);
        assert!(matches!(
            ragged.weight_matrix(),
            Err(ModelError::ShapeMismatch { .. })
        ));
        assert!(ragged.validate().is_err());
        assert!(Classifier::OneVsRest(vec![]).validate().is_err());
        assert!(Classifier::Multinomial(Array2::zeros((0, 3))).validate().is_err());
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        let json = serde_json::to_string(&TrainingMode::OneVsRest).unwrap();
        assert_eq!(json, "\"one_vs_rest\"");
    }
}
