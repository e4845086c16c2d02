//! Loaded model set answering per-record predictions

use crate::artifacts::ArtifactStore;
use crate::error::{DietError, Result};
use crate::preprocessing::PreprocessingBundle;
use crate::training::{GradientBoostedRegressor, Regressor};
use super::request::{inject_bmi, record_to_frame, Record};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Immutable prediction context: the preprocessing bundle plus one
/// regressor per target, all consuming the bundle's feature ordering.
pub struct Predictor {
    bundle: PreprocessingBundle,
    models: Vec<(String, Box<dyn Regressor>)>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("targets", &self.targets())
            .field("features", &self.bundle.feature_columns().len())
            .finish()
    }
}

impl Predictor {
    pub fn new(bundle: PreprocessingBundle, models: Vec<(String, Box<dyn Regressor>)>) -> Self {
        Self { bundle, models }
    }

    /// Load the bundle, the latest run's targets and every declared model.
    ///
    /// A target listed in the latest run without a model file is an error.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let store = ArtifactStore::open(model_dir)?;
        let bundle: PreprocessingBundle = store.load_bundle()?;
        let run = store.read_latest_run()?;
        if run.targets.is_empty() {
            return Err(DietError::ArtifactMissing(format!(
                "latest run in {} declares no targets",
                model_dir.display()
            )));
        }

        let mut models: Vec<(String, Box<dyn Regressor>)> = Vec::with_capacity(run.targets.len());
        for target in &run.targets {
            let bytes = store.load_model_bytes(target)?;
            let model = GradientBoostedRegressor::from_bytes(&bytes)?;
            if model.n_features() != bundle.feature_columns().len() {
                return Err(DietError::ShapeError {
                    expected: format!("{} features", bundle.feature_columns().len()),
                    actual: format!("{} features in model for '{}'", model.n_features(), target),
                });
            }
            models.push((target.clone(), Box::new(model)));
        }

        info!(
            model_dir = %model_dir.display(),
            targets = ?run.targets,
            trained_at = %run.timestamp,
            "Loaded models"
        );
        Ok(Self::new(bundle, models))
    }

    pub fn targets(&self) -> Vec<&str> {
        self.models.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn bundle(&self) -> &PreprocessingBundle {
        &self.bundle
    }

    /// Predict every target for one record.
    pub fn predict(&self, record: &Record) -> Result<BTreeMap<String, f64>> {
        let mut record = record.clone();
        inject_bmi(&mut record, &self.bundle)?;

        let frame = record_to_frame(&record, &self.bundle)?;
        let features = self.bundle.transform(&frame)?;

        let mut predictions = BTreeMap::new();
        for (target, model) in &self.models {
            let value = model
                .predict(&features)?
                .first()
                .copied()
                .ok_or_else(|| DietError::InvalidInput(format!("No prediction for '{}'", target)))?;
            predictions.insert(target.clone(), value);
        }
        Ok(predictions)
    }
}
