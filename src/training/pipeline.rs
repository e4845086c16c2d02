//! End-to-end training run: dataset → per-target models → artifacts

use crate::artifacts::{ArtifactStore, RunRecord};
use crate::error::Result;
use crate::preprocessing::{prepare_features, PreparedData};
use crate::targets::detect_targets;
use crate::utils::{column_names, load_dataset};
use super::{GradientBoostedRegressor, RegressionMetrics, Regressor, TrainTestSplit, TrainingConfig};
use ndarray::{Array1, Axis};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const TOP_FEATURES: usize = 5;

/// A fitted model for one target together with its held-out metrics
#[derive(Debug)]
pub struct TrainedTarget {
    pub target: String,
    pub model: GradientBoostedRegressor,
    pub metrics: RegressionMetrics,
    /// Highest-gain features, descending
    pub top_features: Vec<(String, f64)>,
}

/// Summary of a finished run
#[derive(Debug)]
pub struct TrainingOutcome {
    pub record: RunRecord,
    pub targets: Vec<TrainedTarget>,
    pub feature_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub dropped_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub model_paths: Vec<PathBuf>,
    pub training_time_secs: f64,
}

/// Runs the offline training pipeline for a [`TrainingConfig`]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Load the dataset, train every target and persist the artifacts.
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let df = load_dataset(&self.config.data_path)?;
        let targets = detect_targets(&column_names(&df), &self.config.overrides)?;

        let prepared = prepare_features(&df, &targets, &self.config.preprocessing)?;
        let split = TrainTestSplit::new(
            prepared.features.nrows(),
            self.config.test_size,
            self.config.random_state,
        )?;
        let trained = self.train_targets(&prepared, &split)?;

        let store = ArtifactStore::create(&self.config.model_dir)?;
        let mut model_paths = Vec::with_capacity(trained.len());
        for t in &trained {
            model_paths.push(store.save_model(&t.target, &t.model.to_bytes()?)?);
        }
        store.save_bundle(&prepared.bundle)?;

        let metrics: BTreeMap<String, RegressionMetrics> =
            trained.iter().map(|t| (t.target.clone(), t.metrics)).collect();
        let record = RunRecord::now(targets, metrics);
        store.record_run(&record)?;

        let training_time_secs = start.elapsed().as_secs_f64();
        info!(
            model_dir = %self.config.model_dir.display(),
            secs = training_time_secs,
            "Training finished"
        );

        Ok(TrainingOutcome {
            record,
            targets: trained,
            feature_columns: prepared.bundle.feature_columns().to_vec(),
            dropped_columns: prepared.dropped_columns,
            dropped_rows: prepared.dropped_rows,
            n_train: split.train.len(),
            n_test: split.test.len(),
            model_paths,
            training_time_secs,
        })
    }

    /// Fit and evaluate one regressor per target on a shared split
    pub fn train_targets(&self, prepared: &PreparedData, split: &TrainTestSplit) -> Result<Vec<TrainedTarget>> {
        let (x_train, x_test) = split.apply(&prepared.features);
        let (y_train_all, y_test_all) = split.apply(&prepared.targets);
        info!(train = x_train.nrows(), test = x_test.nrows(), "Split dataset");

        let feature_names = prepared.bundle.feature_columns();
        let mut trained = Vec::with_capacity(prepared.target_names.len());

        for (j, target) in prepared.target_names.iter().enumerate() {
            let y_train: Array1<f64> = y_train_all.index_axis(Axis(1), j).to_owned();
            let y_test: Array1<f64> = y_test_all.index_axis(Axis(1), j).to_owned();

            let start = Instant::now();
            let mut model = GradientBoostedRegressor::new(self.config.boosting.clone());
            model.fit(&x_train, &y_train)?;
            let y_pred = model.predict(&x_test)?;
            let metrics = RegressionMetrics::compute(&y_test, &y_pred);

            let top_features = top_features(&model, feature_names);
            info!(
                target = %target,
                mae = metrics.mae,
                rmse = metrics.rmse,
                r2 = metrics.r2,
                secs = start.elapsed().as_secs_f64(),
                "Trained model"
            );
            info!(target = %target, top = ?top_features, "Top features");

            trained.push(TrainedTarget {
                target: target.clone(),
                model,
                metrics,
                top_features,
            });
        }

        Ok(trained)
    }
}

fn top_features(model: &GradientBoostedRegressor, names: &[String]) -> Vec<(String, f64)> {
    let Some(importances) = model.feature_importances() else {
        return Vec::new();
    };
    let mut ranked: Vec<(String, f64)> = names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .filter(|(_, v)| *v > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_FEATURES);
    ranked
}
