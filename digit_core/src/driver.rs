//! End-to-end runs: train a head, score every partition, record the outcome.

use std::path::PathBuf;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::{CheckpointError, Checkpointable};
use crate::config::EngineConfig;
use crate::data::{prepare, DataError, DigitPools, Partition, PreparedDataset};
use crate::learner::{train, Classifier, ModelError, TrainError, TrainingMode, TrainingResult};
use crate::logging;
use crate::metrics::{accuracy_percent, ConfusionMatrix};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Data preparation failed: {0}")]
    Data(#[from] DataError),

    #[error("Training failed: {0}")]
    Train(#[from] TrainError),

    #[error("Prediction failed: {0}")]
    Model(#[from] ModelError),

    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Journal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Accuracy percentages for one trained head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mode: TrainingMode,
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
    pub test_accuracy: f64,
    pub training_ms: u128,
}

/// Everything produced by [`Driver::run`]
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub training: TrainingResult,
    pub evaluation: EvaluationReport,
    /// Confusion counts on the test partition
    pub test_confusion: ConfusionMatrix,
    /// Where the classifier was saved, if checkpointing is enabled
    pub checkpoint: Option<PathBuf>,
}

impl ModelRun {
    pub fn classifier(&self) -> &Classifier {
        &self.training.classifier
    }
}

/// Owns the prepared dataset and drives training and scoring
pub struct Driver {
    dataset: PreparedDataset,
    config: EngineConfig,
}

impl Driver {
    pub fn new(dataset: PreparedDataset, config: EngineConfig) -> Self {
        Self { dataset, config }
    }

    /// Prepare `pools` with the `[data]` settings of `config`.
    pub fn from_pools(pools: &DigitPools, config: EngineConfig) -> Result<Self, DriverError> {
        let dataset = prepare(pools, &config.data)?;
        Ok(Self::new(dataset, config))
    }

    pub fn dataset(&self) -> &PreparedDataset {
        &self.dataset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Train `mode` on the training partition and score all three partitions.
    pub fn run(&self, mode: TrainingMode) -> Result<ModelRun, DriverError> {
        let mut training_config = self.config.training_config();
        training_config.num_classes = self.dataset.num_classes;

        tracing::info!(
            "Training {} on {} samples x {} features",
            mode,
            self.dataset.train.len(),
            self.dataset.num_features()
        );

        let training = train(
            mode,
            self.dataset.train.data.view(),
            &self.dataset.train.labels,
            &training_config,
        )?;
        let classifier = &training.classifier;

        let (train_accuracy, _) = score(classifier, &self.dataset.train)?;
        let (validation_accuracy, _) = score(classifier, &self.dataset.validation)?;
        let (test_accuracy, test_predictions) = score(classifier, &self.dataset.test)?;

        let evaluation = EvaluationReport {
            mode,
            train_accuracy,
            validation_accuracy,
            test_accuracy,
            training_ms: training.elapsed_ms,
        };
        let test_confusion = ConfusionMatrix::from_predictions(
            &test_predictions,
            &self.dataset.test.labels,
            self.dataset.num_classes,
        );

        tracing::info!(
            "{}: train {:.2}%, validation {:.2}%, test {:.2}%",
            mode,
            train_accuracy,
            validation_accuracy,
            test_accuracy
        );

        if let Some(dir) = &self.config.output.log_dir {
            logging::log_training_run(dir, &training)?;
            logging::log_evaluation(dir, &evaluation)?;
        }

        let checkpoint = match &self.config.output.checkpoint_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.bin", mode.as_str()));
                training.classifier.save_checkpoint(&path)?;
                tracing::debug!("Saved {} classifier to {}", mode, path.display());
                Some(path)
            }
            None => None,
        };

        Ok(ModelRun {
            training,
            evaluation,
            test_confusion,
            checkpoint,
        })
    }

    /// Run every configured mode in order.
    pub fn run_all(&self) -> Result<Vec<ModelRun>, DriverError> {
        self.config.modes.iter().map(|&mode| self.run(mode)).collect()
    }
}

fn score(classifier: &Classifier, partition: &Partition) -> Result<(f64, Array1<usize>), ModelError> {
    if partition.is_empty() {
        return Ok((0.0, Array1::zeros(0)));
    }
    let predicted = classifier.predict(partition.data.view())?;
    Ok((accuracy_percent(&predicted, &partition.labels), predicted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_pools, PrepareConfig, SyntheticConfig};
    use crate::optim::{ConjugateGradient, OptimizerConfig};

    fn small_config() -> EngineConfig {
        EngineConfig {
            data: PrepareConfig {
                num_classes: 3,
                validation_per_class: 10,
                ..Default::default()
            },
            optimizer: OptimizerConfig::ConjugateGradient(ConjugateGradient::with_max_iters(30)),
            ..Default::default()
        }
    }

    fn small_pools() -> DigitPools {
        generate_pools(&SyntheticConfig {
            num_classes: 3,
            side: 6,
            train_per_class: 40,
            test_per_class: 15,
            ..Default::default()
        })
    }

    #[test]
    fn test_run_scores_all_partitions() {
        let driver = Driver::from_pools(&small_pools(), small_config()).unwrap();
        assert_eq!(driver.dataset().validation.len(), 30);

        let run = driver.run(TrainingMode::Multinomial).unwrap();
        let evaluation = &run.evaluation;
        for accuracy in [
            evaluation.train_accuracy,
            evaluation.validation_accuracy,
            evaluation.test_accuracy,
        ] {
            assert!((0.0..=100.0).contains(&accuracy));
        }
        assert_eq!(run.test_confusion.total(), 45);
        assert!(run.checkpoint.is_none());
    }

    #[test]
    fn test_run_all_follows_configured_order() {
        let driver = Driver::from_pools(&small_pools(), small_config()).unwrap();
        let runs = driver.run_all().unwrap();
        let modes: Vec<_> = runs.iter().map(|run| run.evaluation.mode).collect();
        assert_eq!(modes, vec![TrainingMode::OneVsRest, TrainingMode::Multinomial]);
        assert_eq!(runs[0].training.reports.len(), 3);
        assert_eq!(runs[1].training.reports.len(), 1);
    }

    #[test]
    fn test_from_pools_propagates_shape_error() {
        let mut config = small_config();
        config.data.validation_per_class = 1000;
        let err = Driver::from_pools(&small_pools(), config).err().unwrap();
        assert!(matches!(err, DriverError::Data(DataError::DataShape(_))));
    }
}
