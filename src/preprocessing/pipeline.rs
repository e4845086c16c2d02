//! Fitted preprocessing bundle shared by training and serving

use crate::error::{DietError, Result};
use super::{
    encoder::OneHotEncoder,
    imputer::{ImputeStrategy, Imputer},
    schema::align_to_schema,
};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

/// Reusable transform state: imputers, encoder and the canonical feature order.
///
/// Fitted once by the training pipeline and persisted; the prediction service
/// applies the same `transform` to request frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingBundle {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    feature_columns: Vec<String>,
}

impl PreprocessingBundle {
    /// Fit imputers and encoder on the given column partition
    pub fn fit(df: &DataFrame, numeric_columns: &[String], categorical_columns: &[String]) -> Result<Self> {
        let start = Instant::now();

        if numeric_columns.is_empty() && categorical_columns.is_empty() {
            return Err(DietError::PreprocessingError(
                "No feature columns left after filtering".to_string(),
            ));
        }

        let num_cols: Vec<&str> = numeric_columns.iter().map(|s| s.as_str()).collect();
        let cat_cols: Vec<&str> = categorical_columns.iter().map(|s| s.as_str()).collect();

        let mut numeric_imputer = Imputer::new(ImputeStrategy::Median);
        numeric_imputer.fit(df, &num_cols)?;

        let mut categorical_imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let imputed = categorical_imputer.fit_transform(df, &cat_cols)?;

        let mut encoder = OneHotEncoder::new();
        encoder.fit(&imputed, &cat_cols)?;

        let mut feature_columns = numeric_columns.to_vec();
        feature_columns.extend(encoder.feature_names());

        if let Some(duplicate) = first_duplicate(&feature_columns) {
            return Err(DietError::PreprocessingError(format!(
                "Feature column '{}' is produced twice; rename the column that collides with a one-hot indicator",
                duplicate
            )));
        }

        debug!(
            numeric = numeric_columns.len(),
            categorical = categorical_columns.len(),
            features = feature_columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted preprocessing bundle"
        );

        Ok(Self {
            numeric_columns: numeric_columns.to_vec(),
            categorical_columns: categorical_columns.to_vec(),
            numeric_imputer,
            categorical_imputer,
            encoder,
            feature_columns,
        })
    }

    /// Impute, encode and align a frame to the canonical feature order
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let imputed = self.numeric_imputer.transform(df)?;
        let imputed = self.categorical_imputer.transform(&imputed)?;
        let encoded = self.encoder.transform(&imputed)?;
        align_to_schema(&encoded, &self.feature_columns)
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Canonical feature column order every model was trained on
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }
}

fn first_duplicate(names: &[String]) -> Option<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names.iter().find(|name| !seen.insert(name.as_str())).cloned()
}
