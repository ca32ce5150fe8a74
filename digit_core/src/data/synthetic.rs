//! Synthetic digit pools for demos, benchmarks and tests.
//!
//! Every class gets a random binary stroke prototype on a square grid. Samples
//! are the prototype plus uniform intensity noise. The outer border is always
//! zero, so it is removed by variance filtering exactly like the blank margin
//! of real scanned digits.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::pools::DigitPools;

/// Configuration for synthetic pool generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub num_classes: usize,
    /// Image side length; each sample has `side * side` pixels
    pub side: usize,
    pub train_per_class: usize,
    pub test_per_class: usize,
    /// Uniform noise amplitude in intensity units (0-255)
    pub noise_level: f64,
    /// Fraction of interior pixels lit in each prototype
    pub stroke_density: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_classes: 10,
            side: 8,
            train_per_class: 1100,
            test_per_class: 200,
            noise_level: 60.0,
            stroke_density: 0.35,
            seed: 42,
        }
    }
}

/// Generate deterministic train/test pools from `config`.
pub fn generate_pools(config: &SyntheticConfig) -> DigitPools {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let side = config.side;
    let width = side * side;

    let prototypes: Vec<Vec<f64>> = (0..config.num_classes)
        .map(|_| {
            (0..width)
                .map(|idx| {
                    let (r, c) = (idx / side, idx % side);
                    let border = r == 0 || c == 0 || r + 1 == side || c + 1 == side;
                    if !border && rng.gen_bool(config.stroke_density) {
                        255.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    let mut sample_pool = |prototype: &[f64], count: usize| {
        let mut pool = Array2::zeros((count, width));
        for mut row in pool.rows_mut() {
            for (idx, value) in row.iter_mut().enumerate() {
                let (r, c) = (idx / side, idx % side);
                if r == 0 || c == 0 || r + 1 == side || c + 1 == side {
                    continue;
                }
                let noise = (rng.gen::<f64>() * 2.0 - 1.0) * config.noise_level;
                *value = (prototype[idx] + noise).round().clamp(0.0, 255.0) as u8;
            }
        }
        pool
    };

    let mut train = Vec::with_capacity(config.num_classes);
    let mut test = Vec::with_capacity(config.num_classes);
    for prototype in &prototypes {
        train.push(sample_pool(prototype, config.train_per_class));
        test.push(sample_pool(prototype, config.test_per_class));
    }

    DigitPools::new(train, test)
}
