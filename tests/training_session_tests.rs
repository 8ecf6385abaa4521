use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

use facemetrics::config::TrainingConfig;
use facemetrics::error::TrainError;
use facemetrics::model::{CaptureSample, ModelKind, FEATURE_COUNT};
use facemetrics::session::TrainingSession;
use facemetrics::target::TargetKind;

/// Two captures per day over `days` days; the day's metric follows
/// 2*f0 - f1 + 3 of the day's mean feature vector, so the linear family
/// can recover it exactly.
fn linear_captures(days: usize) -> Vec<CaptureSample> {
    let base = Utc.with_ymd_and_hms(2026, 4, 6, 12, 0, 0).unwrap();
    let mut samples = Vec::new();
    for d in 0..days {
        let f0 = d as f64 / (days - 1) as f64;
        let f1 = ((d * 3) % days) as f64 / days as f64;
        let target = 2.0 * f0 - f1 + 3.0;
        for (i, jitter) in [-0.01, 0.01].iter().enumerate() {
            let mut fields = HashMap::new();
            fields.insert("metric".to_string(), format!("{target}"));
            samples.push(CaptureSample {
                id: format!("cap-{d}-{i}"),
                captured_at: base + Duration::days(d as i64) + Duration::minutes(i as i64 * 5),
                features: vec![f0 + jitter, f1 - jitter],
                raw_health_fields: fields,
            });
        }
    }
    samples
}

#[tokio::test]
async fn train_persists_model_and_reports_cv_quality() {
    let dir = tempdir().expect("tempdir");
    let session = TrainingSession::new(TrainingConfig::default(), dir.path());
    let target = TargetKind::Custom("metric".to_string());

    let outcome = session
        .train(&target, &linear_captures(10), ModelKind::Linear)
        .await
        .expect("training should succeed");
    assert_eq!(outcome.day_count, 10);
    assert_eq!(outcome.report.folds.len(), 10);
    assert!(outcome.report.correlation > 0.9, "r = {}", outcome.report.correlation);

    let (model, meta) = session
        .store()
        .load("metric")
        .expect("deployed model should be persisted");
    assert_eq!(model.kind(), ModelKind::Linear);
    assert_eq!(meta.target_id, "metric");
    assert!((meta.correlation - outcome.report.correlation).abs() < f64::EPSILON);
    assert_eq!(meta.feature_count, 2);
}

#[tokio::test]
async fn train_rejects_too_few_days() {
    let dir = tempdir().expect("tempdir");
    let session = TrainingSession::new(TrainingConfig::default(), dir.path());
    let target = TargetKind::Custom("metric".to_string());

    let err = session
        .train(&target, &linear_captures(4), ModelKind::Linear)
        .await
        .expect_err("4 days must be rejected");
    assert!(matches!(
        err,
        TrainError::InsufficientData {
            required: 7,
            actual: 4
        }
    ));
    assert!(session.store().load("metric").is_none());
}

#[tokio::test]
async fn predict_uses_persisted_model() {
    let dir = tempdir().expect("tempdir");
    let session = TrainingSession::new(TrainingConfig::default(), dir.path());
    let target = TargetKind::Custom("metric".to_string());

    session
        .train(&target, &linear_captures(10), ModelKind::Linear)
        .await
        .expect("training should succeed");
    let prediction = session
        .predict(&target, &[0.5, 0.25])
        .await
        .expect("predict should succeed")
        .expect("model should be present");
    // 2*0.5 - 0.25 + 3 = 3.75, ridge tolerance applies
    assert!((prediction - 3.75).abs() < 0.2, "prediction = {prediction}");
}

#[tokio::test]
async fn predict_without_trained_model_is_absent_not_an_error() {
    let dir = tempdir().expect("tempdir");
    let session = TrainingSession::new(TrainingConfig::default(), dir.path());
    let result = session
        .predict(&TargetKind::SleepScore, &[0.5; FEATURE_COUNT])
        .await
        .expect("predict should not error");
    assert!(result.is_none());
}

#[tokio::test]
async fn forest_family_trains_end_to_end() {
    let dir = tempdir().expect("tempdir");
    let session = TrainingSession::new(TrainingConfig::default(), dir.path());
    let target = TargetKind::Custom("metric".to_string());

    let outcome = session
        .train(&target, &linear_captures(12), ModelKind::Forest)
        .await
        .expect("training should succeed");
    assert_eq!(outcome.model_kind, ModelKind::Forest);
    let (model, meta) = session.store().load("metric").expect("persisted");
    assert_eq!(model.kind(), ModelKind::Forest);
    assert_eq!(meta.model_kind, ModelKind::Forest);
}

#[tokio::test]
/// Concurrent train calls for the same target id are serialized by the
/// per-target lock; both complete and the store ends up consistent.
async fn concurrent_training_on_same_target_serializes() {
    let dir = tempdir().expect("tempdir");
    let session = Arc::new(TrainingSession::new(TrainingConfig::default(), dir.path()));
    let target = TargetKind::Custom("metric".to_string());
    let captures = linear_captures(8);

    let a = {
        let session = session.clone();
        let target = target.clone();
        let captures = captures.clone();
        tokio::spawn(async move { session.train(&target, &captures, ModelKind::Linear).await })
    };
    let b = {
        let session = session.clone();
        let target = target.clone();
        let captures = captures.clone();
        tokio::spawn(async move { session.train(&target, &captures, ModelKind::Linear).await })
    };

    a.await.expect("join").expect("first train");
    b.await.expect("join").expect("second train");
    assert!(session.store().load("metric").is_some());
}
