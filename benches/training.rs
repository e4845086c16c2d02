use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diet_predictor::training::{BoostingConfig, GradientBoostedRegressor, Regressor};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_regression_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);

    // Target is a weighted sum of features plus noise
    let y = x
        .rows()
        .into_iter()
        .map(|row| row.iter().enumerate().map(|(j, v)| v * (j + 1) as f64).sum::<f64>() + rng.gen::<f64>() * 0.1)
        .collect();
    (x, y)
}

fn bench_config() -> BoostingConfig {
    BoostingConfig::default().with_n_estimators(100)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000].iter() {
        let data = create_regression_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = GradientBoostedRegressor::new(bench_config());
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let (x, y) = create_regression_data(5000, 10);
    let mut model = GradientBoostedRegressor::new(bench_config());
    model.fit(&x, &y).unwrap();

    for n_rows in [1, 100, 1000].iter() {
        let (test_x, _) = create_regression_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("predict", n_rows), &test_x, |b, x| {
            b.iter(|| model.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
