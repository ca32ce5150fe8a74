//! Raw per-digit sample pools and their on-disk CSV loader.
//!
//! A pool directory holds one headerless CSV file per digit and split:
//! `train0.csv` … `train9.csv` and `test0.csv` … `test9.csv`. Each row is one
//! image flattened to `D_raw` integer intensities in `0..=255`.

use std::fs::File;
use std::path::Path;

use ndarray::Array2;

use super::error::{DataError, DataResult};

/// Raw intensity matrices indexed by digit.
#[derive(Debug, Clone, Default)]
pub struct DigitPools {
    /// Training pool per digit (validation rows are carved from the front)
    pub train: Vec<Array2<u8>>,
    /// Test pool per digit, used in full
    pub test: Vec<Array2<u8>>,
}

impl DigitPools {
    pub fn new(train: Vec<Array2<u8>>, test: Vec<Array2<u8>>) -> Self {
        Self { train, test }
    }

    /// Number of digit groups in the training pool
    pub fn num_digits(&self) -> usize {
        self.train.len()
    }

    /// Check group count, emptiness and a shared feature width.
    ///
    /// Returns the common raw width `D_raw`.
    pub fn validate(&self, num_classes: usize) -> DataResult<usize> {
        if num_classes == 0 {
            return Err(DataError::DataShape("no digit groups requested".into()));
        }
        if self.train.len() != num_classes {
            return Err(DataError::DataShape(format!(
                "expected {} training groups, found {}",
                num_classes,
                self.train.len()
            )));
        }
        if self.test.len() != num_classes {
            return Err(DataError::DataShape(format!(
                "expected {} test groups, found {}",
                num_classes,
                self.test.len()
            )));
        }

        let width = self.train[0].ncols();
        let groups = self
            .train
            .iter()
            .map(|pool| ("training", pool))
            .enumerate()
            .chain(self.test.iter().map(|pool| ("test", pool)).enumerate());

        for (digit, (split, pool)) in groups {
            if pool.nrows() == 0 {
                return Err(DataError::DataShape(format!(
                    "{split} pool for digit {digit} has no samples"
                )));
            }
            if pool.ncols() != width {
                return Err(DataError::DataShape(format!(
                    "{split} pool for digit {digit} has width {}, expected {width}",
                    pool.ncols()
                )));
            }
        }

        if width == 0 {
            return Err(DataError::DataShape("samples have zero features".into()));
        }

        Ok(width)
    }

    /// Load `train{d}.csv` / `test{d}.csv` for `d in 0..num_classes`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P, num_classes: usize) -> DataResult<Self> {
        let dir = dir.as_ref();
        let mut train = Vec::with_capacity(num_classes);
        let mut test = Vec::with_capacity(num_classes);

        for digit in 0..num_classes {
            train.push(read_pool(&dir.join(format!("train{digit}.csv")))?);
            test.push(read_pool(&dir.join(format!("test{digit}.csv")))?);
        }

        tracing::debug!(
            "Loaded {} digit pools from {} ({} training rows)",
            num_classes,
            dir.display(),
            train.iter().map(|pool| pool.nrows()).sum::<usize>()
        );

        Ok(Self { train, test })
    }
}

fn read_pool(path: &Path) -> DataResult<Array2<u8>> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut values = Vec::new();
    let mut rows = 0;
    let mut width = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        width = record.len();
        for (column, field) in record.iter().enumerate() {
            let value = field.parse::<u8>().map_err(|_| DataError::InvalidValue {
                path: path.to_path_buf(),
                row,
                column,
                value: field.to_string(),
            })?;
            values.push(value);
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, width), values)
        .map_err(|err| DataError::DataShape(format!("{}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;

    fn pools(widths: [usize; 2]) -> DigitPools {
        DigitPools::new(
            vec![Array2::zeros((3, widths[0])), Array2::zeros((3, widths[1]))],
            vec![Array2::zeros((2, widths[0])), Array2::zeros((2, widths[0]))],
        )
    }

    #[test]
    fn test_validate_returns_shared_width() {
        assert_eq!(pools([4, 4]).validate(2).unwrap(), 4);
    }

    #[test]
    fn test_validate_rejects_width_mismatch() {
        let err = pools([4, 5]).validate(2).unwrap_err();
        assert!(matches!(err, DataError::DataShape(_)));
    }

    #[test]
    fn test_validate_rejects_missing_group() {
        let err = pools([4, 4]).validate(10).unwrap_err();
        assert!(matches!(err, DataError::DataShape(_)));
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut pools = pools([4, 4]);
        pools.test[1] = Array2::zeros((0, 4));
        assert!(matches!(pools.validate(2), Err(DataError::DataShape(_))));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for digit in 0..2 {
            fs::write(
                dir.path().join(format!("train{digit}.csv")),
                format!("0,{digit},255\n1,2,3\n"),
            )
            .unwrap();
            fs::write(dir.path().join(format!("test{digit}.csv")), "9, 8, 7\n").unwrap();
        }

        let pools = DigitPools::load_from_dir(dir.path(), 2).unwrap();
        assert_eq!(pools.num_digits(), 2);
        assert_eq!(pools.train[1], array![[0u8, 1, 255], [1, 2, 3]]);
        assert_eq!(pools.test[0], array![[9u8, 8, 7]]);
    }

    #[test]
    fn test_load_rejects_out_of_range_intensity() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train0.csv"), "0,256\n").unwrap();
        fs::write(dir.path().join("test0.csv"), "0,1\n").unwrap();

        let err = DigitPools::load_from_dir(dir.path(), 1).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidValue { row: 0, column: 1, .. }
        ));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DigitPools::load_from_dir(dir.path(), 1).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
