//! Synthetic BiciMAD-shaped datasets shared by the integration tests

#![allow(dead_code)]

use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Daily usage where trips depend linearly on weather and calendar columns
pub fn daily_df(n: usize) -> DataFrame {
    let mut cols: Vec<Vec<f64>> = vec![Vec::with_capacity(n); 12];
    for i in 0..n {
        let dow = (i % 7) as f64;
        let weekend = if dow >= 5.0 { 1.0 } else { 0.0 };
        let holiday = if i % 17 == 0 { 1.0 } else { 0.0 };
        let temp = 15.0 + 10.0 * (i as f64 * std::f64::consts::TAU / 60.0).sin();
        let rain = if i % 9 == 0 { 4.0 } else { 0.0 };
        let wind = 10.0 + (i % 5) as f64;
        let trips = 5000.0 + 150.0 * temp - 800.0 * weekend - 500.0 * holiday - 300.0 * rain - 20.0 * wind;

        let row = [
            2022.0 + (i / 60) as f64,
            ((i / 30) % 12 + 1) as f64,
            (i % 30 + 1) as f64,
            dow,
            weekend,
            holiday,
            temp,
            temp + 3.0 + (i % 4) as f64,
            temp - 4.0 - (i % 3) as f64 * 0.5,
            rain,
            wind,
            trips,
        ];
        for (col, value) in cols.iter_mut().zip(row) {
            col.push(value);
        }
    }

    df!(
        "year" => &cols[0],
        "month" => &cols[1],
        "day" => &cols[2],
        "day_of_week" => &cols[3],
        "is_weekend" => &cols[4],
        "is_holiday" => &cols[5],
        "temperature_mean" => &cols[6],
        "temperature_max" => &cols[7],
        "temperature_min" => &cols[8],
        "precipitation" => &cols[9],
        "wind_speed" => &cols[10],
        "trips" => &cols[11]
    )
    .unwrap()
}

/// Hourly usage: the daily pattern plus a commute-shaped hour profile
pub fn hourly_df(n: usize) -> DataFrame {
    let mut df = daily_df(n);
    let hours: Vec<f64> = (0..n).map(|i| (i % 24) as f64).collect();
    let trips: Vec<f64> = df
        .column("trips")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .zip(&hours)
        .map(|(t, h)| t / 24.0 + if (7.0..=9.0).contains(h) || (17.0..=19.0).contains(h) { 150.0 } else { 0.0 })
        .collect();
    df.with_column(Column::new("hour".into(), hours)).unwrap();
    df.with_column(Column::new("trips".into(), trips)).unwrap();
    df
}

/// Write `df` as CSV at `home/relative`, creating directories
pub fn write_csv(home: &Path, relative: &str, df: &mut DataFrame) {
    let path = home.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = File::create(path).unwrap();
    CsvWriter::new(&mut file).include_header(true).finish(df).unwrap();
}
