//! Feature preparation: column selection, bundle fitting and target clipping

use crate::error::{DietError, Result};
use crate::utils::{column_names, distinct_values, is_numeric_dtype, numeric_values};
use super::{
    config::PreprocessingConfig,
    outlier::{ClipBounds, PercentileClipper},
    pipeline::PreprocessingBundle,
};
use ndarray::Array2;
use polars::prelude::*;
use tracing::info;

/// Output of feature preparation, before the train/test split
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Encoded feature matrix, columns in `bundle.feature_columns()` order
    pub features: Array2<f64>,
    /// Clipped targets, one column per entry of `target_names`
    pub targets: Array2<f64>,
    pub target_names: Vec<String>,
    pub bundle: PreprocessingBundle,
    /// Identifier-like and high-cardinality columns removed from the features
    pub dropped_columns: Vec<String>,
    /// Rows removed because a target value was missing
    pub dropped_rows: usize,
    pub clip_bounds: Vec<ClipBounds>,
}

/// How the candidate feature columns were partitioned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub dropped: Vec<String>,
}

/// Split columns into numeric and categorical features, dropping identifiers,
/// the targets themselves and high-cardinality categorical columns.
pub fn partition_columns(
    df: &DataFrame,
    targets: &[String],
    config: &PreprocessingConfig,
) -> Result<ColumnPartition> {
    let mut partition = ColumnPartition::default();

    for name in column_names(df) {
        if targets.contains(&name) {
            continue;
        }
        if config.is_id_column(&name) {
            partition.dropped.push(name);
            continue;
        }

        let dtype = df.column(&name)?.dtype().clone();
        if is_numeric_dtype(&dtype) {
            partition.numeric.push(name);
        } else if distinct_values(df, &name)?.len() > config.max_categories {
            partition.dropped.push(name);
        } else {
            partition.categorical.push(name);
        }
    }

    Ok(partition)
}

/// Rows where every target is present
fn complete_target_rows(df: &DataFrame, targets: &[String]) -> Result<Vec<bool>> {
    let mut keep = vec![true; df.height()];
    for target in targets {
        for (i, v) in numeric_values(df, target)?.into_iter().enumerate() {
            if v.is_none() {
                keep[i] = false;
            }
        }
    }
    Ok(keep)
}

/// Build the feature and target matrices and fit the preprocessing bundle.
pub fn prepare_features(
    df: &DataFrame,
    targets: &[String],
    config: &PreprocessingConfig,
) -> Result<PreparedData> {
    for target in targets {
        let column = df
            .column(target)
            .map_err(|_| DietError::FeatureNotFound(target.clone()))?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(DietError::ConfigError(format!(
                "Target column '{}' is not numeric ({:?})",
                target,
                column.dtype()
            )));
        }
    }

    let keep = complete_target_rows(df, targets)?;
    let dropped_rows = keep.iter().filter(|k| !**k).count();
    let df = if dropped_rows > 0 {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df.filter(&mask)?
    } else {
        df.clone()
    };
    if df.height() == 0 {
        return Err(DietError::DataError("No rows with complete target values".to_string()));
    }
    if dropped_rows > 0 {
        info!(dropped_rows, "Dropped rows with missing target values");
    }

    let partition = partition_columns(&df, targets, config)?;
    if !partition.dropped.is_empty() {
        info!(columns = ?partition.dropped, "Dropping identifier and high-cardinality columns");
    }
    info!(columns = ?partition.numeric, "Numeric columns");
    info!(columns = ?partition.categorical, "Categorical columns");

    let bundle = PreprocessingBundle::fit(&df, &partition.numeric, &partition.categorical)?;
    let features = bundle.transform(&df)?;

    let clipper = PercentileClipper::new(config.clip_lower, config.clip_upper)?;
    let mut target_matrix = Array2::<f64>::zeros((df.height(), targets.len()));
    let mut clip_bounds = Vec::with_capacity(targets.len());
    for (j, target) in targets.iter().enumerate() {
        let mut values: Vec<f64> = numeric_values(&df, target)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let bounds = clipper
            .clip_in_place(&mut values)
            .ok_or_else(|| DietError::DataError(format!("Target '{}' has no values", target)))?;
        for (i, v) in values.into_iter().enumerate() {
            target_matrix[[i, j]] = v;
        }
        clip_bounds.push(bounds);
    }

    info!(
        rows = features.nrows(),
        features = features.ncols(),
        targets = targets.len(),
        "Prepared feature matrix"
    );

    Ok(PreparedData {
        features,
        targets: target_matrix,
        target_names: targets.to_vec(),
        bundle,
        dropped_columns: partition.dropped,
        dropped_rows,
        clip_bounds,
    })
}
