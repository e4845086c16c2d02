//! One-hot encoding for categorical columns

use crate::error::{DietError, Result};
use crate::utils::{distinct_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted vocabulary of a single categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub column: String,
    /// Categories in first-appearance order
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    /// Name of the indicator column produced for a category
    pub fn indicator_name(&self, category: &str) -> String {
        format!("{}_{}", self.column, category)
    }
}

/// One-hot encoder that tolerates unknown categories.
///
/// Each fitted column is replaced by one `f64` indicator column per known
/// category. A value outside the vocabulary (or a null) encodes as all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    vocabularies: Vec<CategoryVocabulary>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.vocabularies = columns
            .iter()
            .map(|col| {
                Ok(CategoryVocabulary {
                    column: col.to_string(),
                    categories: distinct_values(df, col)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(DietError::ModelNotFitted);
        }

        let mut result = df.clone();
        let height = df.height();

        for vocab in &self.vocabularies {
            let values: Vec<Option<String>> = if df.column(&vocab.column).is_ok() {
                string_values(df, &vocab.column)?
            } else {
                vec![None; height]
            };

            for category in &vocab.categories {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| if v.as_deref() == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                let series = Series::new(vocab.indicator_name(category).into(), indicator);
                result
                    .with_column(series)
                    .map_err(|e| DietError::DataError(e.to_string()))?;
            }

            if result.column(&vocab.column).is_ok() {
                result = result
                    .drop(&vocab.column)
                    .map_err(|e| DietError::DataError(e.to_string()))?;
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Indicator column names in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| v.categories.iter().map(move |c| v.indicator_name(c)))
            .collect()
    }
}
