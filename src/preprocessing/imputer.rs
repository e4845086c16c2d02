//! Missing value imputation

use crate::error::{DietError, Result};
use crate::utils::{numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with the median (numeric only)
    Median,
    /// Replace with the most frequent value (categorical)
    MostFrequent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// `transform` fills nulls in every fitted column and also materializes
/// fitted columns that are absent from the input, so a frame missing a
/// schema column comes out with that column set to the learned statistic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    columns: Vec<String>,
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            columns: Vec::new(),
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.columns.clear();
        self.fill_values.clear();

        for col_name in columns {
            let fill_value = match self.strategy {
                ImputeStrategy::Median => {
                    let values: Vec<f64> = numeric_values(df, col_name)?.into_iter().flatten().collect();
                    ImputeValue::Numeric(median(&values).unwrap_or(0.0))
                }
                ImputeStrategy::MostFrequent => {
                    let values: Vec<String> = string_values(df, col_name)?.into_iter().flatten().collect();
                    ImputeValue::String(most_frequent(&values).unwrap_or_default())
                }
            };
            self.columns.push(col_name.to_string());
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(DietError::ModelNotFitted);
        }

        let mut result = df.clone();
        let height = df.height();

        for col_name in &self.columns {
            let fill_value = self
                .fill_values
                .get(col_name)
                .ok_or_else(|| DietError::PreprocessingError(format!("No fill value for '{}'", col_name)))?;
            let present = df.column(col_name).is_ok();

            let filled = match fill_value {
                ImputeValue::Numeric(val) => {
                    let values: Vec<f64> = if present {
                        numeric_values(df, col_name)?
                            .into_iter()
                            .map(|v| v.unwrap_or(*val))
                            .collect()
                    } else {
                        vec![*val; height]
                    };
                    Series::new(col_name.as_str().into(), values)
                }
                ImputeValue::String(val) => {
                    let values: Vec<String> = if present {
                        string_values(df, col_name)?
                            .into_iter()
                            .map(|v| v.unwrap_or_else(|| val.clone()))
                            .collect()
                    } else {
                        vec![val.clone(); height]
                    };
                    Series::new(col_name.as_str().into(), values)
                }
            };

            result
                .with_column(filled)
                .map_err(|e| DietError::DataError(e.to_string()))?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned numeric fill value for a column
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        match self.fill_values.get(column) {
            Some(ImputeValue::Numeric(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Median of the values, averaging the two middle elements for even counts
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties resolve to the lexicographically smallest
fn most_frequent(values: &[String]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, so keeping the first maximum breaks ties
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(!imputer.is_fitted);
        assert!(imputer.transform(&DataFrame::default()).is_err());
    }

    #[test]
    fn test_median_imputation() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1.0), None, Some(3.0), Some(10.0)]),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(3.0));
        assert_eq!(imputer.numeric_fill("a"), Some(3.0));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_most_frequent_tie_breaks_lexicographically() {
        let values: Vec<String> = ["b", "a", "b", "a", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(most_frequent(&values), Some("a".to_string()));
    }

    #[test]
    fn test_most_frequent_imputation() {
        let df = DataFrame::new(vec![
            Column::new("g".into(), &[Some("Male"), Some("Female"), None, Some("Female")]),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["g"]).unwrap();
        let col = result.column("g").unwrap().str().unwrap();
        assert_eq!(col.get(2), Some("Female"));
    }

    #[test]
    fn test_absent_column_is_materialized() {
        let train = DataFrame::new(vec![
            Column::new("a".into(), &[1.0, 2.0, 5.0]),
            Column::new("b".into(), &[1.0, 1.0, 1.0]),
        ])
        .unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&train, &["a", "b"]).unwrap();

        let request = DataFrame::new(vec![Column::new("b".into(), &[7.0])]).unwrap();
        let result = imputer.transform(&request).unwrap();
        assert_eq!(result.column("a").unwrap().f64().unwrap().get(0), Some(2.0));
        assert_eq!(result.column("b").unwrap().f64().unwrap().get(0), Some(7.0));
    }

    #[test]
    fn test_all_missing_numeric_falls_back_to_zero() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[None::<f64>, None]),
        ])
        .unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&df, &["a"]).unwrap();
        assert_eq!(imputer.numeric_fill("a"), Some(0.0));
    }
}
