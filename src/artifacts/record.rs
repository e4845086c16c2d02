//! Training run records

use crate::training::RegressionMetrics;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of one training run.
///
/// Appended to the history log and written as the latest-run file; the
/// prediction service reads `targets` to know which models to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Local time, ISO-8601 with second precision
    pub timestamp: String,
    pub targets: Vec<String>,
    pub metrics: BTreeMap<String, RegressionMetrics>,
}

impl RunRecord {
    /// Record stamped with the current local time
    pub fn now(targets: Vec<String>, metrics: BTreeMap<String, RegressionMetrics>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            targets,
            metrics,
        }
    }
}
