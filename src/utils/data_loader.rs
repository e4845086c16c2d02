//! Dataset loading and column inspection helpers

use crate::error::{DietError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Field values read as missing in every column, besides empty fields
pub const NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a CSV dataset with a header row.
///
/// The whole file is scanned for schema inference, so a column whose first
/// rows look integral still loads as float when a later row has a fraction.
/// A missing file is reported as [`DietError::DatasetNotFound`] so the
/// training entry point can fail with a configuration error instead of a
/// generic IO error.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DietError::DatasetNotFound(path.display().to_string()));
    }

    let start = Instant::now();
    let file = File::open(path)?;
    let null_values = NULL_TOKENS.iter().map(|t| PlSmallStr::from(*t)).collect();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(null_values))),
        )
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| DietError::DataError(e.to_string()))?;

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded dataset"
    );
    Ok(df)
}

/// Whether a dtype is treated as numeric by the preprocessing pipeline.
///
/// Booleans count as numeric and are cast to 0.0/1.0.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

/// Column names of a frame as owned strings, in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Extract a column as `f64` values, keeping missing entries as `None`
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| DietError::FeatureNotFound(name.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| DietError::DataError(format!("column '{}': {}", name, e)))?;
    let ca = casted
        .f64()
        .map_err(|e| DietError::DataError(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

/// Extract a column as strings, keeping missing entries as `None`
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| DietError::FeatureNotFound(name.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| DietError::DataError(format!("column '{}': {}", name, e)))?;
    let ca = casted
        .str()
        .map_err(|e| DietError::DataError(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

/// Distinct non-null values of a column rendered as strings, in first-seen order
pub fn distinct_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for value in string_values(df, name)?.into_iter().flatten() {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_csv() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "Age,Gender,Calories").unwrap();
        writeln!(file, "30,Male,2100").unwrap();
        writeln!(file, "41,Female,").unwrap();
        writeln!(file, ",Female,1800").unwrap();
        file
    }

    #[test]
    fn test_load_dataset() {
        let file = create_test_csv();
        let df = load_dataset(file.path()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(column_names(&df), vec!["Age", "Gender", "Calories"]);
    }

    #[test]
    fn test_missing_dataset() {
        let err = load_dataset(Path::new("/nonexistent/diet.csv")).unwrap_err();
        assert!(matches!(err, DietError::DatasetNotFound(_)));
    }

    #[test]
    fn test_numeric_and_string_values() {
        let file = create_test_csv();
        let df = load_dataset(file.path()).unwrap();

        assert!(is_numeric_dtype(df.column("Age").unwrap().dtype()));
        assert!(!is_numeric_dtype(df.column("Gender").unwrap().dtype()));
        assert_eq!(numeric_values(&df, "Age").unwrap(), vec![Some(30.0), Some(41.0), None]);
        assert_eq!(distinct_values(&df, "Gender").unwrap(), vec!["Male", "Female"]);
    }

    #[test]
    fn test_late_fraction_loads_as_float() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Age,Calories").unwrap();
        for i in 0..1500 {
            let age = if i == 1200 { "70.5".to_string() } else { (20 + i % 50).to_string() };
            writeln!(file, "{},{}", age, 1800 + i).unwrap();
        }

        let df = load_dataset(file.path()).unwrap();
        assert_eq!(df.height(), 1500);
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Float64);
        assert_eq!(numeric_values(&df, "Age").unwrap()[1200], Some(70.5));
    }

    #[test]
    fn test_null_tokens_are_missing() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Age,Gender").unwrap();
        writeln!(file, "30,Male").unwrap();
        writeln!(file, "NA,Female").unwrap();
        writeln!(file, "41,N/A").unwrap();
        writeln!(file, "null,Male").unwrap();
        writeln!(file, "NaN,None").unwrap();

        let df = load_dataset(file.path()).unwrap();
        assert!(is_numeric_dtype(df.column("Age").unwrap().dtype()));
        assert_eq!(
            numeric_values(&df, "Age").unwrap(),
            vec![Some(30.0), None, Some(41.0), None, None]
        );
        assert_eq!(distinct_values(&df, "Gender").unwrap(), vec!["Male", "Female"]);
    }
}
