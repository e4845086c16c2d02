//! Nutritional target detection
//!
//! Resolves which dataset columns hold calories, protein, carbs and fat by
//! case-insensitive substring matching on column names. Overrides supplied
//! through [`TargetOverrides`] take precedence over detection.

use crate::error::{DietError, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Nutritional quantity a model is trained to predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetCategory {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl TargetCategory {
    /// Categories in output order
    pub const ALL: [TargetCategory; 4] = [
        TargetCategory::Calories,
        TargetCategory::Protein,
        TargetCategory::Carbs,
        TargetCategory::Fat,
    ];

    /// Candidate substrings matched against column names
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            TargetCategory::Calories => &["calorie", "kcal", "calories"],
            TargetCategory::Protein => &["protein", "prot"],
            TargetCategory::Carbs => &["carb", "carbohydrate"],
            TargetCategory::Fat => &["fat", "fats", "lipid"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCategory::Calories => "calories",
            TargetCategory::Protein => "protein",
            TargetCategory::Carbs => "carbs",
            TargetCategory::Fat => "fat",
        }
    }
}

impl fmt::Display for TargetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetCategory {
    type Err = DietError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "calories" | "calorie" | "kcal" => Ok(TargetCategory::Calories),
            "protein" => Ok(TargetCategory::Protein),
            "carbs" | "carb" | "carbohydrates" => Ok(TargetCategory::Carbs),
            "fat" | "fats" => Ok(TargetCategory::Fat),
            other => Err(DietError::ConfigError(format!("Unknown target category: {}", other))),
        }
    }
}

/// Manual column assignments that bypass name detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetOverrides(BTreeMap<TargetCategory, String>);

impl TargetOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: TargetCategory, column: impl Into<String>) -> Self {
        self.0.insert(category, column.into());
        self
    }

    pub fn get(&self, category: TargetCategory) -> Option<&str> {
        self.0.get(&category).map(|s| s.as_str())
    }

    /// Parse `category=column` pairs as given on the command line
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut overrides = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (category, column) = pair.split_once('=').ok_or_else(|| {
                DietError::ConfigError(format!("Expected category=column, got '{}'", pair))
            })?;
            let column = column.trim();
            if column.is_empty() {
                return Err(DietError::ConfigError(format!("Empty column in override '{}'", pair)));
            }
            overrides = overrides.with(category.parse()?, column);
        }
        Ok(overrides)
    }
}

/// First column whose name matches any candidate, case-insensitively
fn find_column<'a>(columns: &'a [String], candidates: &[&str]) -> Result<Option<&'a str>> {
    let pattern = candidates
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| DietError::ConfigError(e.to_string()))?;
    Ok(columns.iter().find(|c| re.is_match(c)).map(|c| c.as_str()))
}

/// Resolve the ordered target column list.
///
/// Returns an error when no category resolves to a column, or when an
/// override names a column absent from the dataset.
pub fn detect_targets(columns: &[String], overrides: &TargetOverrides) -> Result<Vec<String>> {
    let mut resolved: Vec<(TargetCategory, Option<String>)> = Vec::with_capacity(4);

    for category in TargetCategory::ALL {
        let column = match overrides.get(category) {
            Some(col) => {
                if !columns.iter().any(|c| c == col) {
                    return Err(DietError::ConfigError(format!(
                        "Override for {} names unknown column '{}'",
                        category, col
                    )));
                }
                Some(col.to_string())
            }
            None => find_column(columns, category.candidates())?.map(|s| s.to_string()),
        };
        resolved.push((category, column));
    }

    let summary: Vec<String> = resolved
        .iter()
        .map(|(cat, col)| format!("{}={}", cat, col.as_deref().unwrap_or("-")))
        .collect();
    info!(targets = %summary.join(", "), "Detected target columns");

    let mut targets: Vec<String> = Vec::new();
    for (_, column) in resolved {
        if let Some(col) = column {
            // one column may match several categories, e.g. "protein_fat_ratio"
            if !targets.contains(&col) {
                targets.push(col);
            }
        }
    }

    if targets.is_empty() {
        return Err(DietError::ConfigError(
            "No target columns detected. Pass --target <category>=<column> to map them manually".to_string(),
        ));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_all_four_in_category_order() {
        let columns = cols(&[
            "Age",
            "Recommended_Fats",
            "Recommended_Calories",
            "Recommended_Carbs",
            "Recommended_Protein",
        ]);
        let targets = detect_targets(&columns, &TargetOverrides::new()).unwrap();
        assert_eq!(
            targets,
            cols(&["Recommended_Calories", "Recommended_Protein", "Recommended_Carbs", "Recommended_Fats"])
        );
    }

    #[test]
    fn test_case_insensitive_and_first_match_wins() {
        let columns = cols(&["daily_KCAL", "CALORIES_burned", "Lipid_g"]);
        let targets = detect_targets(&columns, &TargetOverrides::new()).unwrap();
        assert_eq!(targets, cols(&["daily_KCAL", "Lipid_g"]));
    }

    #[test]
    fn test_no_targets_is_config_error() {
        let columns = cols(&["Age", "Gender", "Height_cm"]);
        let err = detect_targets(&columns, &TargetOverrides::new()).unwrap_err();
        assert!(matches!(err, DietError::ConfigError(_)));
    }

    #[test]
    fn test_override_replaces_detection() {
        let columns = cols(&["Energy", "Protein"]);
        let overrides = TargetOverrides::parse_pairs(&["calories=Energy"]).unwrap();
        let targets = detect_targets(&columns, &overrides).unwrap();
        assert_eq!(targets, cols(&["Energy", "Protein"]));
    }

    #[test]
    fn test_override_unknown_column() {
        let columns = cols(&["Protein"]);
        let overrides = TargetOverrides::new().with(TargetCategory::Fat, "Missing");
        assert!(detect_targets(&columns, &overrides).is_err());
    }

    #[test]
    fn test_parse_pairs_rejects_garbage() {
        assert!(TargetOverrides::parse_pairs(&["calories"]).is_err());
        assert!(TargetOverrides::parse_pairs(&["sugar=Sugar"]).is_err());
    }
}
