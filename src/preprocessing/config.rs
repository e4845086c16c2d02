//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Configuration for feature preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Identifier-like column names, matched case-insensitively and dropped
    pub id_columns: Vec<String>,

    /// Categorical columns with more distinct values than this are dropped
    pub max_categories: usize,

    /// Lower percentile (0..1) targets are clipped to
    pub clip_lower: f64,

    /// Upper percentile (0..1) targets are clipped to
    pub clip_upper: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            id_columns: ["id", "user_id", "index", "seqn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_categories: 50,
            clip_lower: 0.01,
            clip_upper: 0.99,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the high-cardinality guard
    pub fn with_max_categories(mut self, max_categories: usize) -> Self {
        self.max_categories = max_categories;
        self
    }

    /// Builder method to set the target clipping percentiles
    pub fn with_clip_percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.clip_lower = lower;
        self.clip_upper = upper;
        self
    }

    /// Whether a column name looks like a row identifier
    pub fn is_id_column(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.id_columns.iter().any(|c| c.to_lowercase() == lowered)
    }
}
