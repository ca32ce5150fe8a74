//! Classification metrics over predicted and true digit labels.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Percentage of positions where `predicted` equals `truth`.
///
/// Returns 0.0 for empty input. Only the overlapping prefix is compared if
/// the lengths differ, and the denominator is the longer length.
pub fn accuracy_percent(predicted: &Array1<usize>, truth: &Array1<usize>) -> f64 {
    let total = predicted.len().max(truth.len());
    if total == 0 {
        return 0.0;
    }

    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();

    100.0 * correct as f64 / total as f64
}

/// Recall statistics for a single digit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecall {
    pub class: usize,
    /// `TP / (TP + FN)` as a percentage
    pub recall: f64,
    /// Number of true examples of the class
    pub support: u64,
}

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// Row-major `K×K` counts (`truth * K + predicted`)
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    /// Tally label pairs; pairs outside `0..num_classes` are skipped.
    pub fn from_predictions(
        predicted: &Array1<usize>,
        truth: &Array1<usize>,
        num_classes: usize,
    ) -> Self {
        let mut matrix = Self::new(num_classes);
        for (&p, &t) in predicted.iter().zip(truth.iter()) {
            matrix.add(t, p);
        }
        matrix
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.num_classes || predicted >= self.num_classes {
            return;
        }
        self.counts[truth * self.num_classes + predicted] += 1;
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u64 {
        if truth >= self.num_classes || predicted >= self.num_classes {
            return 0;
        }
        self.counts[truth * self.num_classes + predicted]
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Overall accuracy as a percentage
    pub fn accuracy_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.num_classes).map(|class| self.get(class, class)).sum();
        100.0 * correct as f64 / total as f64
    }

    /// Recall per class, 0.0 for classes with no true examples
    pub fn per_class_recall(&self) -> Vec<ClassRecall> {
        (0..self.num_classes)
            .map(|class| {
                let support: u64 = (0..self.num_classes).map(|p| self.get(class, p)).sum();
                let recall = if support == 0 {
                    0.0
                } else {
                    100.0 * self.get(class, class) as f64 / support as f64
                };
                ClassRecall {
                    class,
                    recall,
                    support,
                }
            })
            .collect()
    }
}
