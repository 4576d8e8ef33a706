//! Criterion benchmarks for the ingestion hot paths.
//!
//! Benchmarks:
//! 1. Upload normalization (decode + parse + canonicalize) at several sizes
//! 2. Remote normalization of the equivalent JSON payload
//! 3. Forecast + reconcile over a normalized month

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use eco2mix_core::data::{normalize_remote, normalize_upload, RemoteRecord, SourceEncoding};
use eco2mix_core::model::{LinearModel, StandardScaler};
use eco2mix_core::{forecast, reconcile, ActualPricePoint, ClockPolicy, ModelArtifact};

// ── Helpers ──────────────────────────────────────────────────────────

fn slot(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(15 * i as i64)
}

fn make_upload(n: usize) -> Vec<u8> {
    let mut text = String::from("Périmètre\tNature\tDate\tHeures\tConsommation\tGaz\tNucléaire\t\n");
    for i in 0..n {
        let dt = slot(i);
        let gaz = if i % 7 == 0 { "ND".to_string() } else { (3000 + i % 500).to_string() };
        text.push_str(&format!(
            "France\tDonnées temps réel\t{}\t{}\t{}\t{gaz}\t{}\t\n",
            dt.format("%Y-%m-%d"),
            dt.format("%H:%M"),
            60000 + i % 1000,
            40000 + i % 300,
        ));
    }
    text.push_str("RTE ne pourra être tenu responsable de l'usage qui pourrait être fait des données\n");
    text.chars().map(|c| c as u32 as u8).collect()
}

fn make_remote(n: usize) -> Vec<RemoteRecord> {
    (0..n)
        .map(|i| {
            let value = serde_json::json!({
                "perimetre": "France",
                "date_heure": format!("{}+01:00", slot(i).format("%Y-%m-%dT%H:%M:%S")),
                "consommation": 60000 + i % 1000,
                "gaz": if i % 7 == 0 { serde_json::Value::Null } else { serde_json::json!(3000 + i % 500) },
                "nucleaire": 40000 + i % 300,
            });
            match value {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

fn make_artifact() -> ModelArtifact {
    ModelArtifact::new(
        "bench",
        Box::new(LinearModel {
            feature_names_in: vec!["Consommation".into(), "Gaz".into(), "Nucléaire".into()],
            coef: vec![0.3, 0.2, -0.1],
            intercept: 50.0,
        }),
        Box::new(StandardScaler {
            mean: vec![60000.0, 3000.0, 40000.0],
            scale: vec![5000.0, 500.0, 2000.0],
        }),
    )
}

// ── 1. Upload ────────────────────────────────────────────────────────

fn bench_upload(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_upload");
    for n in [96usize, 96 * 31, 96 * 365] {
        let raw = make_upload(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| normalize_upload(black_box(raw), SourceEncoding::Latin1).unwrap())
        });
    }
    group.finish();
}

// ── 2. Remote ────────────────────────────────────────────────────────

fn bench_remote(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_remote");
    for n in [96usize, 96 * 31] {
        let records = make_remote(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| normalize_remote(black_box(records)))
        });
    }
    group.finish();
}

// ── 3. Forecast + reconcile ──────────────────────────────────────────

fn bench_forecast_reconcile(c: &mut Criterion) {
    let frame = normalize_upload(&make_upload(96 * 31), SourceEncoding::Latin1).unwrap();
    let artifact = make_artifact();
    let actuals: Vec<ActualPricePoint> = (0..96 * 31)
        .step_by(4)
        .map(|i| ActualPricePoint {
            datetime: slot(i).and_utc(),
            price: 80.0 + (i % 40) as f64,
        })
        .collect();

    c.bench_function("forecast_reconcile_month", |b| {
        b.iter(|| {
            let points = forecast(black_box(&frame), &artifact).unwrap();
            reconcile(&points, black_box(&actuals), ClockPolicy::EuropeParis)
        })
    });
}

criterion_group!(benches, bench_upload, bench_remote, bench_forecast_reconcile);
criterion_main!(benches);
