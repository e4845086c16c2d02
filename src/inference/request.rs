//! Conversion of JSON prediction requests into one-row frames

use crate::error::{DietError, Result};
use crate::preprocessing::PreprocessingBundle;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const BMI_COLUMN: &str = "BMI";
pub const HEIGHT_COLUMN: &str = "Height_cm";
pub const WEIGHT_COLUMN: &str = "Weight_kg";

/// A prediction request: feature name → JSON value
pub type Record = Map<String, Value>;

/// Fixed profile served by `GET /diet-with-model`
pub fn sample_profile() -> Record {
    let value = json!({
        "Age": 30,
        "Gender": "Male",
        "Height_cm": 170,
        "Weight_kg": 70,
        "Activity_Level": "Moderate"
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Numeric reading of a request value; `Ok(None)` means missing
fn numeric_value(column: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            DietError::InvalidInput(format!("Feature '{}' expects a number, got {:?}", column, s))
        }),
        other => Err(DietError::InvalidInput(format!(
            "Feature '{}' expects a number, got {}",
            column, other
        ))),
    }
}

/// Categorical reading of a request value; `Ok(None)` means missing
fn categorical_value(column: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(DietError::InvalidInput(format!(
            "Feature '{}' expects a category, got {}",
            column, other
        ))),
    }
}

/// Add `BMI = Weight_kg / (Height_cm / 100)^2` when the bundle was trained
/// with a numeric BMI column and both inputs read as numbers, with the same
/// coercion the feature frame applies.
///
/// An explicit BMI in the request is replaced.
pub fn inject_bmi(record: &mut Record, bundle: &PreprocessingBundle) -> Result<()> {
    if !bundle.is_numeric(BMI_COLUMN) {
        return Ok(());
    }
    let height = match record.get(HEIGHT_COLUMN) {
        Some(v) => numeric_value(HEIGHT_COLUMN, v)?,
        None => None,
    };
    let weight = match record.get(WEIGHT_COLUMN) {
        Some(v) => numeric_value(WEIGHT_COLUMN, v)?,
        None => None,
    };
    let (Some(height), Some(weight)) = (height, weight) else {
        return Ok(());
    };
    if height <= 0.0 {
        return Err(DietError::InvalidInput(format!(
            "{} must be positive, got {}",
            HEIGHT_COLUMN, height
        )));
    }

    let meters = height / 100.0;
    let bmi = weight / (meters * meters);
    debug!(height, weight, bmi, "Injected BMI");
    record.insert(BMI_COLUMN.to_string(), json!(bmi));
    Ok(())
}

/// Build a one-row frame holding every column the bundle was fitted on.
///
/// Absent keys become nulls for the imputers to fill; keys the bundle does
/// not know are ignored.
pub fn record_to_frame(record: &Record, bundle: &PreprocessingBundle) -> Result<DataFrame> {
    let mut columns: Vec<Column> =
        Vec::with_capacity(bundle.numeric_columns().len() + bundle.categorical_columns().len());

    for name in bundle.numeric_columns() {
        let value = match record.get(name) {
            Some(v) => numeric_value(name, v)?,
            None => None,
        };
        columns.push(Column::new(name.as_str().into(), &[value]));
    }
    for name in bundle.categorical_columns() {
        let value = match record.get(name) {
            Some(v) => categorical_value(name, v)?,
            None => None,
        };
        columns.push(Column::new(name.as_str().into(), &[value]));
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_profile() {
        let profile = sample_profile();
        assert_eq!(profile.len(), 5);
        assert_eq!(profile["Gender"], json!("Male"));
        assert_eq!(profile["Height_cm"], json!(170));
    }

    #[test]
    fn test_numeric_value_coercion() {
        assert_eq!(numeric_value("Age", &json!(30)).unwrap(), Some(30.0));
        assert_eq!(numeric_value("Age", &json!("31.5")).unwrap(), Some(31.5));
        assert_eq!(numeric_value("Age", &json!(true)).unwrap(), Some(1.0));
        assert_eq!(numeric_value("Age", &Value::Null).unwrap(), None);
        assert!(numeric_value("Age", &json!("thirty")).is_err());
        assert!(numeric_value("Age", &json!([1, 2])).is_err());
    }

    #[test]
    fn test_categorical_value_coercion() {
        assert_eq!(categorical_value("Gender", &json!("Male")).unwrap(), Some("Male".into()));
        assert_eq!(categorical_value("Level", &json!(3)).unwrap(), Some("3".into()));
        assert!(categorical_value("Gender", &json!({"a": 1})).is_err());
    }

    fn bmi_bundle() -> PreprocessingBundle {
        let df = DataFrame::new(vec![
            Column::new("Height_cm".into(), &[160.0, 180.0]),
            Column::new("Weight_kg".into(), &[60.0, 80.0]),
            Column::new("BMI".into(), &[23.4, 24.7]),
        ])
        .unwrap();
        PreprocessingBundle::fit(
            &df,
            &["Height_cm".to_string(), "Weight_kg".to_string(), "BMI".to_string()],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn test_inject_bmi_from_numeric_strings() {
        let mut record = Record::new();
        record.insert("Height_cm".into(), json!("200"));
        record.insert("Weight_kg".into(), json!(" 100 "));
        inject_bmi(&mut record, &bmi_bundle()).unwrap();
        assert_eq!(record["BMI"], json!(25.0));
    }

    #[test]
    fn test_inject_bmi_skips_missing_weight() {
        let mut record = Record::new();
        record.insert("Height_cm".into(), json!(170));
        record.insert("Weight_kg".into(), json!(""));
        inject_bmi(&mut record, &bmi_bundle()).unwrap();
        assert!(!record.contains_key("BMI"));
    }
}
