//! Digit pools, partition preparation and label encodings.

pub mod error;
pub mod labels;
pub mod pools;
pub mod prepare;
pub mod synthetic;

pub use error::{DataError, DataResult};
pub use labels::{binary_labels, one_hot};
pub use pools::DigitPools;
pub use prepare::{prepare, FeatureMask, Partition, PrepareConfig, PreparedDataset};
pub use synthetic::{generate_pools, SyntheticConfig};
