use bicimad_forecast::training::{
    LinearRegression, RandomForestRegressor, Regressor, XGBoostConfig, XGBoostRegressor,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;

// Hourly-shaped data: 12 features, trips driven by hour and temperature
fn create_hourly_data(n_rows: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let x = Array2::from_shape_fn((n_rows, 12), |(i, j)| match j {
        3 => (i % 24) as f64,
        7 => 15.0 + 10.0 * rng.gen::<f64>(),
        _ => rng.gen::<f64>() * 10.0,
    });
    let y = x
        .rows()
        .into_iter()
        .map(|row| {
            let peak = if (7.0..=9.0).contains(&row[3]) || (17.0..=19.0).contains(&row[3]) { 300.0 } else { 50.0 };
            peak + 12.0 * row[7] - 5.0 * row[9]
        })
        .collect();
    (x, y)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [1000, 5000, 20000].iter() {
        let data = create_hourly_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("linear_regression", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = LinearRegression::new();
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("random_forest", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = RandomForestRegressor::new(20).with_max_depth(Some(12)).with_random_state(42);
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("xgboost", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = XGBoostRegressor::new(XGBoostConfig {
                    n_estimators: 50,
                    ..XGBoostConfig::default()
                });
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let (train_x, train_y) = create_hourly_data(5000);
    let mut forest = RandomForestRegressor::new(50).with_random_state(42);
    forest.fit(&train_x, &train_y).unwrap();

    for n_rows in [100, 1000, 10000].iter() {
        let (x, _) = create_hourly_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("random_forest", n_rows), &x, |b, x| {
            b.iter(|| forest.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
