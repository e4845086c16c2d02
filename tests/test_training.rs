//! Integration test: Training pipeline end-to-end

use diet_predictor::artifacts::ArtifactStore;
use diet_predictor::inference::{inject_bmi, record_to_frame, sample_profile, Predictor};
use diet_predictor::targets::{TargetCategory, TargetOverrides};
use diet_predictor::training::{
    BoostingConfig, GradientBoostedRegressor, Regressor, TrainingConfig, TrainingPipeline,
};
use diet_predictor::utils::load_dataset;
use diet_predictor::DietError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Synthetic diet dataset with a BMI column and four nutrition targets
fn write_diet_csv(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("Personalized_Diet_Recommendations.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "User_ID,Age,Gender,Height_cm,Weight_kg,BMI,Activity_Level,Daily_Calorie_Target,Protein_Grams,Carbohydrates_Grams,Fat_Grams"
    )
    .unwrap();

    let levels = ["Sedentary", "Moderate", "Active"];
    for i in 0..rows {
        let age = 18 + (i * 7) % 50;
        let gender = if i % 3 == 0 { "Female" } else { "Male" };
        let height = 150.0 + ((i * 13) % 45) as f64;
        let weight = 50.0 + ((i * 11) % 50) as f64;
        let bmi = weight / (height / 100.0).powi(2);
        let level = levels[i % 3];
        let factor = 1.2 + 0.2 * (i % 3) as f64;
        let calories = (10.0 * weight + 6.25 * height - 5.0 * age as f64) * factor;
        // leave a few gaps for the imputers
        let age_field = if i % 17 == 0 { String::new() } else { age.to_string() };
        let level_field = if i % 19 == 0 { "" } else { level };
        writeln!(
            file,
            "{},{},{},{:.1},{:.1},{:.2},{},{:.0},{:.1},{:.1},{:.1}",
            i,
            age_field,
            gender,
            height,
            weight,
            bmi,
            level_field,
            calories,
            calories * 0.25 / 4.0,
            calories * 0.5 / 4.0,
            calories * 0.25 / 9.0
        )
        .unwrap();
    }
    path
}

fn fast_boosting() -> BoostingConfig {
    BoostingConfig::default()
        .with_n_estimators(30)
        .with_max_leaves(8)
        .with_min_child_samples(3)
}

fn config(data: &Path, model_dir: &Path) -> TrainingConfig {
    TrainingConfig::new(data, model_dir).with_boosting(fast_boosting())
}

#[test]
fn test_pipeline_persists_one_model_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 120);
    let model_dir = dir.path().join("diet_model");

    let outcome = TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();
    let expected = vec!["Daily_Calorie_Target", "Protein_Grams", "Carbohydrates_Grams", "Fat_Grams"];
    assert_eq!(outcome.record.targets, expected);
    assert_eq!(outcome.n_test, 24);

    let model_files: Vec<String> = std::fs::read_dir(&model_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".json") && name != "preprocess.json" && name != "last_run.json")
        .collect();
    assert_eq!(model_files.len(), expected.len());

    let store = ArtifactStore::open(&model_dir).unwrap();
    let latest = store.read_latest_run().unwrap();
    assert_eq!(latest.targets, expected);
    for target in &expected {
        let metrics = latest.metrics.get(*target).unwrap();
        assert!(metrics.mae.is_finite() && metrics.rmse + 1e-9 >= metrics.mae);
    }
}

#[test]
fn test_history_accumulates_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 60);
    let model_dir = dir.path().join("diet_model");

    TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();
    TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();

    let store = ArtifactStore::open(&model_dir).unwrap();
    assert_eq!(store.read_history().unwrap().len(), 2);
}

#[test]
fn test_same_seed_gives_identical_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 100);
    let first_dir = dir.path().join("first");
    let second_dir = dir.path().join("second");

    let first = TrainingPipeline::new(config(&data, &first_dir)).run().unwrap();
    let second = TrainingPipeline::new(config(&data, &second_dir)).run().unwrap();
    assert_eq!(first.record.metrics, second.record.metrics);

    let a = Predictor::load(&first_dir).unwrap().predict(&sample_profile()).unwrap();
    let b = Predictor::load(&second_dir).unwrap().predict(&sample_profile()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_served_models_match_trained_models() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 150);
    let model_dir = dir.path().join("diet_model");
    let outcome = TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();

    let predictor = Predictor::load(&model_dir).unwrap();
    let mut record = sample_profile();
    inject_bmi(&mut record, predictor.bundle()).unwrap();
    let row = predictor
        .bundle()
        .transform(&record_to_frame(&record, predictor.bundle()).unwrap())
        .unwrap();
    let served = predictor.predict(&sample_profile()).unwrap();
    for trained in &outcome.targets {
        assert_eq!(served[&trained.target], trained.model.predict(&row).unwrap()[0]);
    }

    // every training row, not just the sample profile
    let x = predictor.bundle().transform(&load_dataset(&data).unwrap()).unwrap();
    let store = ArtifactStore::open(&model_dir).unwrap();
    for trained in &outcome.targets {
        let bytes = store.load_model_bytes(&trained.target).unwrap();
        let restored = GradientBoostedRegressor::from_bytes(&bytes).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), trained.model.predict(&x).unwrap());
    }
}

#[test]
fn test_predictor_injects_bmi() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 100);
    let model_dir = dir.path().join("diet_model");
    TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();

    let predictor = Predictor::load(&model_dir).unwrap();
    assert!(predictor.bundle().is_numeric("BMI"));

    // an explicit BMI is recomputed from height and weight
    let mut with_bmi = sample_profile();
    with_bmi.insert("BMI".into(), serde_json::json!(99.0));
    assert_eq!(
        predictor.predict(&sample_profile()).unwrap(),
        predictor.predict(&with_bmi).unwrap()
    );

    let mut bad_height = sample_profile();
    bad_height.insert("Height_cm".into(), serde_json::json!(0));
    assert!(matches!(predictor.predict(&bad_height), Err(DietError::InvalidInput(_))));
}

#[test]
fn test_missing_model_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 60);
    let model_dir = dir.path().join("diet_model");
    TrainingPipeline::new(config(&data, &model_dir)).run().unwrap();

    std::fs::remove_file(model_dir.join("Fat_Grams.json")).unwrap();
    assert!(matches!(Predictor::load(&model_dir), Err(DietError::ArtifactMissing(_))));
}

#[test]
fn test_no_targets_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.csv");
    std::fs::write(&path, "Age,Weight_kg\n30,70\n40,80\n").unwrap();

    let err = TrainingPipeline::new(config(&path, &dir.path().join("out"))).run().unwrap_err();
    assert!(matches!(err, DietError::ConfigError(_)));
}

#[test]
fn test_unknown_override_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_diet_csv(dir.path(), 30);
    let overrides = TargetOverrides::new().with(TargetCategory::Fat, "Lipids");

    let err = TrainingPipeline::new(config(&data, &dir.path().join("out")).with_overrides(overrides))
        .run()
        .unwrap_err();
    assert!(matches!(err, DietError::ConfigError(_)));
}

#[test]
fn test_missing_dataset_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrainingPipeline::new(config(&dir.path().join("absent.csv"), &dir.path().join("out")))
        .run()
        .unwrap_err();
    assert!(matches!(err, DietError::DatasetNotFound(_)));
}
