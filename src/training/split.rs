//! Seeded train/test splitting

use crate::error::{DietError, Result};
use ndarray::{Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_size * n_rows)` rows
    pub fn new(n_rows: usize, test_size: f64, seed: u64) -> Result<Self> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DietError::ConfigError(format!("test_size must be in (0, 1), got {}", test_size)));
        }
        let n_test = (n_rows as f64 * test_size).ceil() as usize;
        if n_rows < 2 || n_test >= n_rows {
            return Err(DietError::DataError(format!(
                "Not enough rows ({}) for a {:.0}% test split",
                n_rows,
                test_size * 100.0
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..n_rows).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        Ok(Self { train, test: indices })
    }

    /// Select the train and test rows of a matrix
    pub fn apply(&self, data: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        (data.select(Axis(0), &self.train), data.select(Axis(0), &self.test))
    }
}
