//! Data preprocessing module
//!
//! Tabular preprocessing shared by the training pipeline and the prediction
//! service:
//! - Median / most-frequent imputation
//! - One-hot encoding with unknown-category tolerance
//! - Alignment to the canonical feature schema
//! - Percentile clipping of regression targets

mod config;
mod encoder;
mod imputer;
mod pipeline;
pub mod features;
pub mod outlier;
pub mod schema;

pub use config::PreprocessingConfig;
pub use encoder::{CategoryVocabulary, OneHotEncoder};
pub use features::{partition_columns, prepare_features, ColumnPartition, PreparedData};
pub use imputer::{ImputeStrategy, Imputer};
pub use outlier::{ClipBounds, PercentileClipper};
pub use pipeline::PreprocessingBundle;
pub use schema::align_to_schema;
