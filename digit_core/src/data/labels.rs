//! Label encodings derived from a label vector.

use ndarray::{Array1, Array2};

/// `N × num_classes` matrix with a single 1.0 per row at the label's column.
///
/// Labels outside `0..num_classes` produce an all-zero row.
pub fn one_hot(labels: &Array1<usize>, num_classes: usize) -> Array2<f64> {
    let mut encoded = Array2::zeros((labels.len(), num_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label < num_classes {
            encoded[[row, label]] = 1.0;
        }
    }
    encoded
}

/// 1.0 where the label equals `class`, 0.0 elsewhere
pub fn binary_labels(labels: &Array1<usize>, class: usize) -> Array1<f64> {
    labels.mapv(|label| if label == class { 1.0 } else { 0.0 })
}
