//! Train/validation/test partitioning, feature filtering and scaling.
//!
//! The validation carve-out takes the first `validation_per_class` rows of
//! every digit's training pool in input order. Nothing is shuffled, so the
//! split is only as deterministic as the order the pools arrive in.

use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::error::{DataError, DataResult};
use super::pools::DigitPools;

/// Settings for building partitions from raw pools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Number of digit groups expected in the pools
    pub num_classes: usize,
    /// Rows withheld from the front of each training pool
    pub validation_per_class: usize,
    /// A feature is kept iff its training standard deviation exceeds this
    pub std_threshold: f64,
    /// Divisor applied to every retained intensity
    pub intensity_scale: f64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            num_classes: 10,
            validation_per_class: 1000,
            std_threshold: 0.001,
            intensity_scale: 255.0,
        }
    }
}

/// A sample matrix with its index-aligned label vector
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub data: Array2<f64>,
    pub labels: Array1<usize>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn num_features(&self) -> usize {
        self.data.ncols()
    }
}

/// Column indices retained after variance filtering.
///
/// Computed once from the training partition and applied unchanged to every
/// other partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMask {
    kept: Vec<usize>,
    raw_width: usize,
}

impl FeatureMask {
    /// Keep every column whose population standard deviation exceeds `threshold`.
    pub fn compute(train: &Array2<f64>, threshold: f64) -> DataResult<Self> {
        if train.nrows() == 0 {
            return Err(DataError::EmptyPartition(
                "training partition has no rows to measure variance on".into(),
            ));
        }

        let sigma = train.std_axis(Axis(0), 0.0);
        let kept: Vec<usize> = sigma
            .iter()
            .enumerate()
            .filter(|&(_, &std)| std > threshold)
            .map(|(idx, _)| idx)
            .collect();

        if kept.is_empty() {
            return Err(DataError::EmptyPartition(format!(
                "all {} features have standard deviation <= {threshold}",
                train.ncols()
            )));
        }

        Ok(Self {
            kept,
            raw_width: train.ncols(),
        })
    }

    pub fn kept(&self) -> &[usize] {
        &self.kept
    }

    /// Number of retained features `D`
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Width `D_raw` of the matrices this mask was computed on
    pub fn raw_width(&self) -> usize {
        self.raw_width
    }

    pub fn apply(&self, matrix: &Array2<f64>) -> Array2<f64> {
        matrix.select(Axis(1), &self.kept)
    }
}

/// The three partitions plus the mask that produced them
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
    pub mask: FeatureMask,
    pub num_classes: usize,
}

impl PreparedDataset {
    /// Retained feature count `D` shared by all partitions
    pub fn num_features(&self) -> usize {
        self.mask.len()
    }
}

/// Build train/validation/test partitions from raw digit pools.
pub fn prepare(pools: &DigitPools, config: &PrepareConfig) -> DataResult<PreparedDataset> {
    pools.validate(config.num_classes)?;

    let n_val = config.validation_per_class;
    for (digit, pool) in pools.train.iter().enumerate() {
        if pool.nrows() < n_val {
            return Err(DataError::DataShape(format!(
                "training pool for digit {digit} has {} samples, fewer than the {n_val} withheld for validation",
                pool.nrows()
            )));
        }
    }

    let validation = stack_groups(
        pools
            .train
            .iter()
            .map(|pool| pool.slice(ndarray::s![..n_val, ..])),
    )?;
    let train = stack_groups(
        pools
            .train
            .iter()
            .map(|pool| pool.slice(ndarray::s![n_val.., ..])),
    )?;
    let test = stack_groups(pools.test.iter().map(|pool| pool.view()))?;

    if train.is_empty() {
        return Err(DataError::EmptyPartition(
            "no training samples remain after the validation carve-out".into(),
        ));
    }

    let mask = FeatureMask::compute(&train.data, config.std_threshold)?;
    let scale = config.intensity_scale;
    let finish = |partition: Partition| Partition {
        data: mask.apply(&partition.data) / scale,
        labels: partition.labels,
    };

    let (train, validation, test) = (finish(train), finish(validation), finish(test));

    let prepared = PreparedDataset {
        train,
        validation,
        test,
        mask,
        num_classes: config.num_classes,
    };

    tracing::info!(
        "Prepared partitions: train={} validation={} test={} features={}/{}",
        prepared.train.len(),
        prepared.validation.len(),
        prepared.test.len(),
        prepared.mask.len(),
        prepared.mask.raw_width()
    );

    Ok(prepared)
}

/// Concatenate per-digit row blocks, labeling each block by its digit index.
fn stack_groups<'a, I>(groups: I) -> DataResult<Partition>
where
    I: Iterator<Item = ArrayView2<'a, u8>>,
{
    let views: Vec<ArrayView2<'a, u8>> = groups.collect();
    let labels: Array1<usize> = views
        .iter()
        .enumerate()
        .flat_map(|(digit, view)| std::iter::repeat(digit).take(view.nrows()))
        .collect();

    let data = concatenate(Axis(0), &views)
        .map_err(|err| DataError::DataShape(format!("cannot stack digit groups: {err}")))?
        .mapv(f64::from);

    Ok(Partition { data, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config(num_classes: usize, validation_per_class: usize) -> PrepareConfig {
        PrepareConfig {
            num_classes,
            validation_per_class,
            ..Default::default()
        }
    }

    #[test]
    fn test_mask_keeps_only_varying_column() {
        let train = array![[7.0, 0.0], [7.0, 10.0], [7.0, 3.0]];
        let mask = FeatureMask::compute(&train, 0.001).unwrap();
        assert_eq!(mask.kept(), &[1]);
        assert_eq!(mask.raw_width(), 2);
        assert_eq!(mask.apply(&train), array![[0.0], [10.0], [3.0]]);
    }

    #[test]
    fn test_mask_rejects_all_constant() {
        let train = array![[1.0, 2.0], [1.0, 2.0]];
        let err = FeatureMask::compute(&train, 0.001).unwrap_err();
        assert!(matches!(err, DataError::EmptyPartition(_)));
    }

    #[test]
    fn test_prepare_splits_in_input_order() {
        let pools = DigitPools::new(
            vec![
                array![[0u8, 10], [0, 20], [0, 30]],
                array![[0u8, 40], [0, 50], [0, 60]],
            ],
            vec![array![[0u8, 255]], array![[0u8, 0]]],
        );

        let prepared = prepare(&pools, &small_config(2, 1)).unwrap();

        // column 0 is constant in training and dropped everywhere
        assert_eq!(prepared.num_features(), 1);
        assert_eq!(prepared.validation.labels, array![0, 1]);
        assert_eq!(
            prepared.validation.data,
            array![[10.0 / 255.0], [40.0 / 255.0]]
        );
        assert_eq!(prepared.train.labels, array![0, 0, 1, 1]);
        assert_eq!(prepared.train.data[[0, 0]], 20.0 / 255.0);
        assert_eq!(prepared.train.data[[3, 0]], 60.0 / 255.0);
        assert_eq!(prepared.test.data, array![[1.0], [0.0]]);
        assert_eq!(prepared.test.labels, array![0, 1]);
    }

    #[test]
    fn test_prepare_rejects_small_pool() {
        let pools = DigitPools::new(
            vec![array![[0u8, 1]], array![[0u8, 1], [2, 3]]],
            vec![array![[0u8, 1]], array![[0u8, 1]]],
        );
        let err = prepare(&pools, &small_config(2, 2)).unwrap_err();
        assert!(matches!(err, DataError::DataShape(_)));
    }

    #[test]
    fn test_prepare_rejects_empty_training_partition() {
        let pools = DigitPools::new(
            vec![array![[0u8, 1]], array![[4u8, 1]]],
            vec![array![[0u8, 1]], array![[0u8, 1]]],
        );
        let err = prepare(&pools, &small_config(2, 1)).unwrap_err();
        assert!(matches!(err, DataError::EmptyPartition(_)));
    }

    #[test]
    fn test_validation_mask_ignores_validation_variance() {
        // column 1 varies only inside the validation rows
        let pools = DigitPools::new(
            vec![
                array![[0u8, 99], [10, 5], [20, 5]],
                array![[0u8, 1], [30, 5], [40, 5]],
            ],
            vec![array![[1u8, 2]], array![[3u8, 4]]],
        );
        let prepared = prepare(&pools, &small_config(2, 1)).unwrap();
        assert_eq!(prepared.mask.kept(), &[0]);
        assert_eq!(prepared.validation.num_features(), 1);
        assert_eq!(prepared.test.num_features(), 1);
    }
}
