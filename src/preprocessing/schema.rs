//! Alignment of transformed frames to the canonical feature schema

use crate::error::Result;
use crate::utils::numeric_values;
use ndarray::Array2;
use polars::prelude::*;

/// Build a feature matrix whose columns follow `schema` exactly.
///
/// Columns of `df` that are not in the schema are ignored. Schema columns
/// absent from `df`, and null cells, take the encoded-absence value `0.0`.
pub fn align_to_schema(df: &DataFrame, schema: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut x = Array2::<f64>::zeros((n_rows, schema.len()));

    for (j, name) in schema.iter().enumerate() {
        if df.column(name).is_err() {
            continue;
        }
        let values = numeric_values(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            x[[i, j]] = v.unwrap_or(0.0);
        }
    }

    Ok(x)
}
