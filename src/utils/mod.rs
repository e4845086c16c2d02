//! Utility functions shared by training and serving

pub mod data_loader;

pub use data_loader::{column_names, distinct_values, is_numeric_dtype, load_dataset, numeric_values, string_values};
