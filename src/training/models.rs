//! Regressor trait and evaluation metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Regression metrics on a held-out split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root Mean Squared Error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Coefficient of determination
    #[serde(rename = "R2")]
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute MAE, RMSE and R² for aligned truth/prediction vectors.
    ///
    /// R² follows the usual convention for a constant target: 1.0 for a
    /// perfect fit, otherwise 0.0.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len().max(1) as f64;
        let mean = y_true.mean().unwrap_or(0.0);

        let mut abs_sum = 0.0;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            abs_sum += (t - p).abs();
            ss_res += (t - p).powi(2);
            ss_tot += (t - mean).powi(2);
        }

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            mae: abs_sum / n,
            rmse: (ss_res / n).sqrt(),
            r2,
        }
    }
}

/// Trait for per-target regression models
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Normalized feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Serialize the fitted model
    fn to_bytes(&self) -> Result<Vec<u8>>;
}
