//! Training run configuration

use crate::error::{DietError, Result};
use crate::preprocessing::PreprocessingConfig;
use crate::targets::TargetOverrides;
use super::BoostingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATASET: &str = "Personalized_Diet_Recommendations.csv";
pub const DEFAULT_MODEL_DIR: &str = "diet_model";

/// Configuration for one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV dataset to train on
    pub data_path: PathBuf,
    /// Directory receiving models, bundle and run records
    pub model_dir: PathBuf,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub random_state: u64,
    pub preprocessing: PreprocessingConfig,
    /// Manual target column choices, replacing detection per category
    pub overrides: TargetOverrides,
    pub boosting: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATASET),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            test_size: 0.2,
            random_state: 42,
            preprocessing: PreprocessingConfig::default(),
            overrides: TargetOverrides::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new(data_path: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_preprocessing(mut self, config: PreprocessingConfig) -> Self {
        self.preprocessing = config;
        self
    }

    pub fn with_overrides(mut self, overrides: TargetOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_boosting(mut self, config: BoostingConfig) -> Self {
        self.boosting = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(DietError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        self.boosting.validate()
    }
}
