use chrono::{Duration, TimeZone, Utc};

use facemetrics::error::TrainError;
use facemetrics::model::{DaySample, ModelKind};
use facemetrics::trainer::{cross_validate, ForestParams, MIN_TRAINING_DAYS};

fn linear_days(n: usize) -> Vec<DaySample> {
    // target = 2*f0 - f1 + 3, exactly
    (0..n)
        .map(|i| {
            let f0 = i as f64 / (n - 1) as f64;
            let f1 = ((i * 3) % n) as f64 / n as f64;
            let base = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
            DaySample {
                day: (base + Duration::days(i as i64)).date_naive(),
                features: vec![f0, f1],
                target: 2.0 * f0 - f1 + 3.0,
                representative_at: base + Duration::days(i as i64),
                source_capture_ids: vec![format!("cap-{i}")],
            }
        })
        .collect()
}

#[test]
fn fewer_than_seven_days_is_insufficient() {
    let days = linear_days(6);
    let err = cross_validate(&days, ModelKind::Linear, &ForestParams::default())
        .expect_err("6 days must be rejected");
    match err {
        TrainError::InsufficientData { required, actual } => {
            assert_eq!(required, MIN_TRAINING_DAYS);
            assert_eq!(actual, 6);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn exactly_seven_days_yields_seven_folds() {
    let days = linear_days(7);
    let report = cross_validate(&days, ModelKind::Linear, &ForestParams::default())
        .expect("7 days is the minimum and must succeed");
    assert_eq!(report.folds.len(), 7);
}

#[test]
/// Noiseless linear data: held-out predictions track the generating
/// function, so the cross-validation correlation is essentially 1.
fn linear_family_scores_near_perfect_on_noiseless_data() {
    let days = linear_days(10);
    let report = cross_validate(&days, ModelKind::Linear, &ForestParams::default())
        .expect("validation should succeed");
    assert!(report.correlation > 0.99, "r = {}", report.correlation);
    assert!(report.mean_absolute_error < 0.1);
    assert!(report.root_mean_squared_error < 0.15);
}

#[test]
fn folds_are_ordered_by_day_and_carry_source_ids() {
    let mut days = linear_days(8);
    days.reverse(); // caller ordering must not matter
    let report = cross_validate(&days, ModelKind::Linear, &ForestParams::default())
        .expect("validation should succeed");
    for pair in report.folds.windows(2) {
        assert!(pair[0].day < pair[1].day);
    }
    assert!(report
        .folds
        .iter()
        .all(|f| f.source_capture_ids.len() == 1));
    // Each fold carries its day's representative capture timestamp.
    assert!(report
        .folds
        .iter()
        .all(|f| f.representative_at.date_naive() == f.day));
}

#[test]
/// The forest family runs the same protocol; with a clear step signal the
/// validation correlation should be solidly positive even with ensemble
/// randomness (statistical tolerance, never exact equality).
fn forest_family_scores_positive_on_step_data() {
    let n = 14;
    let days: Vec<DaySample> = (0..n)
        .map(|i| {
            let f0 = i as f64 / (n - 1) as f64;
            let base = Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap();
            DaySample {
                day: (base + Duration::days(i as i64)).date_naive(),
                features: vec![f0, 0.5],
                target: if f0 > 0.5 { 10.0 } else { 0.0 },
                representative_at: base + Duration::days(i as i64),
                source_capture_ids: vec![format!("cap-{i}")],
            }
        })
        .collect();
    let report = cross_validate(&days, ModelKind::Forest, &ForestParams::default())
        .expect("validation should succeed");
    assert_eq!(report.folds.len(), n);
    assert!(report.correlation > 0.5, "r = {}", report.correlation);
}
