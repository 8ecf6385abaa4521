use chrono::{DateTime, NaiveDate, Utc};

use crate::error::TrainError;
use crate::model::{DaySample, ModelKind, TrainedModel};
use crate::predictor;
use crate::trainer::{fit_model, ForestParams};

/// Minimum number of day-aggregated samples before any fitting is attempted.
pub const MIN_TRAINING_DAYS: usize = 7;

#[derive(Debug, Clone)]
pub struct FoldOutcome {
    pub day: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
    pub representative_at: DateTime<Utc>,
    pub source_capture_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub correlation: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub folds: Vec<FoldOutcome>,
}

/// Leave-one-day-out cross-validation. Each fold trains a throwaway model
/// on every other day and predicts the held-out one; fold models are never
/// the model that gets deployed. A fold whose ridge solve degenerates falls
/// back to predicting that fold's training-target mean, so one bad fold
/// never aborts the whole run.
pub fn cross_validate(
    days: &[DaySample],
    kind: ModelKind,
    params: &ForestParams,
) -> Result<ValidationReport, TrainError> {
    if days.len() < MIN_TRAINING_DAYS {
        return Err(TrainError::InsufficientData {
            required: MIN_TRAINING_DAYS,
            actual: days.len(),
        });
    }

    let mut days: Vec<&DaySample> = days.iter().collect();
    days.sort_by_key(|d| d.day);

    let mut folds = Vec::with_capacity(days.len());
    for held_out in 0..days.len() {
        let mut train_features = Vec::with_capacity(days.len() - 1);
        let mut train_targets = Vec::with_capacity(days.len() - 1);
        for (i, day) in days.iter().enumerate() {
            if i != held_out {
                train_features.push(day.features.clone());
                train_targets.push(day.target);
            }
        }

        let held = days[held_out];
        let fit = fit_model(kind, &train_features, &train_targets, params);
        let predicted = fold_prediction(fit, &held.features, &train_targets)?;

        folds.push(FoldOutcome {
            day: held.day,
            actual: held.target,
            predicted,
            representative_at: held.representative_at,
            source_capture_ids: held.source_capture_ids.clone(),
        });
    }

    let actual: Vec<f64> = folds.iter().map(|f| f.actual).collect();
    let predicted: Vec<f64> = folds.iter().map(|f| f.predicted).collect();
    let report = ValidationReport {
        correlation: pearson_correlation(&actual, &predicted),
        mean_absolute_error: mean_absolute_error(&actual, &predicted),
        root_mean_squared_error: root_mean_squared_error(&actual, &predicted),
        folds,
    };
    tracing::debug!(
        folds = report.folds.len(),
        correlation = report.correlation,
        mae = report.mean_absolute_error,
        rmse = report.root_mean_squared_error,
        "Cross-validation finished"
    );
    Ok(report)
}

/// One fold's prediction from its fit result. A singular ridge solve is
/// recoverable here: the fold predicts its training-target mean instead of
/// aborting the whole validation run. Any other failure propagates.
fn fold_prediction(
    fit: Result<TrainedModel, TrainError>,
    held_features: &[f64],
    train_targets: &[f64],
) -> Result<f64, TrainError> {
    match fit {
        Ok(model) => Ok(predictor::predict(&model, held_features)),
        Err(TrainError::SingularMatrix) => {
            tracing::warn!("Fold solve was singular; falling back to training-target mean");
            Ok(mean(train_targets))
        }
        Err(e) => Err(e),
    }
}

/// Pearson r; 0.0 when either sequence has no variance.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a) * (x - mean_a);
        var_b += (y - mean_b) * (y - mean_b);
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    cov / denom
}

fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum::<f64>()
        / actual.len() as f64)
        .sqrt()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
