//! Model training module
//!
//! Provides the per-target regression stack:
//! - Histogram-based, leaf-wise gradient boosted trees
//! - Seeded train/test splitting
//! - Regression metrics (MAE, RMSE, R²)
//! - The end-to-end training pipeline writing artifacts

mod boosting;
mod config;
mod models;
mod pipeline;
pub mod split;

pub use boosting::{BoostingConfig, GradientBoostedRegressor};
pub use config::{TrainingConfig, DEFAULT_DATASET, DEFAULT_MODEL_DIR};
pub use models::{RegressionMetrics, Regressor};
pub use pipeline::{TrainedTarget, TrainingOutcome, TrainingPipeline};
pub use split::TrainTestSplit;
