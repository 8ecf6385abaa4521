use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::aggregate::aggregate_days;
use crate::config::TrainingConfig;
use crate::error::TrainError;
use crate::model::{CaptureSample, ModelKind, ModelMetadata, TrainedModel};
use crate::predictor;
use crate::store::ModelStore;
use crate::target::TargetKind;
use crate::trainer::{cross_validate, fit_model, ValidationReport};

#[derive(Debug)]
pub struct TrainingOutcome {
    pub target_id: String,
    pub model_kind: ModelKind,
    pub report: ValidationReport,
    pub day_count: usize,
    pub trained_at: DateTime<Utc>,
}

/// Orchestrates one target's full training pipeline: day aggregation,
/// leave-one-day-out validation, a final fit on the complete sample set,
/// and persistence of the deployed model with its CV correlation.
///
/// Concurrent `train` calls for the same target id are serialized through a
/// per-target async mutex; distinct targets proceed independently. The
/// sequential N+1 fits run on the blocking pool so the caller's executor
/// stays responsive.
pub struct TrainingSession {
    config: TrainingConfig,
    store: ModelStore,
    target_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TrainingSession {
    pub fn new(config: TrainingConfig, store_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            store: ModelStore::new(store_root),
            target_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    async fn target_lock(&self, target_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.target_locks.lock().await;
        locks
            .entry(target_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn train(
        &self,
        target: &TargetKind,
        samples: &[CaptureSample],
        kind: ModelKind,
    ) -> Result<TrainingOutcome, TrainError> {
        let target_id = target.id().to_string();
        let lock = self.target_lock(&target_id).await;
        let _guard = lock.lock().await;

        let days = aggregate_days(
            samples,
            |fields| target.extract(fields),
            self.config.aggregation.day_target_policy,
        );
        let day_count = days.len();
        tracing::info!(
            target_id = %target_id,
            captures = samples.len(),
            days = day_count,
            kind = %kind,
            "Training started"
        );

        let params = self.config.forest;
        let (report, model) = tokio::task::spawn_blocking(move || {
            let report = cross_validate(&days, kind, &params)?;
            let features: Vec<Vec<f64>> = days.iter().map(|d| d.features.clone()).collect();
            let targets: Vec<f64> = days.iter().map(|d| d.target).collect();
            // The deployed model is always refit on every day; fold models
            // from the validation pass are already gone.
            let model = fit_model(kind, &features, &targets, &params)?;
            Ok::<_, TrainError>((report, model))
        })
        .await
        .map_err(|e| TrainError::Task(e.to_string()))??;

        let trained_at = Utc::now();
        let metadata = ModelMetadata {
            target_id: target_id.clone(),
            correlation: report.correlation,
            trained_at,
            feature_count: feature_count(&model),
            model_kind: kind,
        };
        self.store.save(&target_id, &model, &metadata)?;
        tracing::info!(
            target_id = %target_id,
            correlation = report.correlation,
            mae = report.mean_absolute_error,
            "Training complete"
        );

        Ok(TrainingOutcome {
            target_id,
            model_kind: kind,
            report,
            day_count,
            trained_at,
        })
    }

    /// Evaluate the persisted model for a target against a fresh feature
    /// vector. `Ok(None)` means no model has been trained yet.
    pub async fn predict(
        &self,
        target: &TargetKind,
        features: &[f64],
    ) -> Result<Option<f64>, TrainError> {
        Ok(self
            .store
            .load(target.id())
            .map(|(model, _)| predictor::predict(&model, features)))
    }
}

fn feature_count(model: &TrainedModel) -> usize {
    match model {
        TrainedModel::Linear { coefficients, .. } => coefficients.len(),
        TrainedModel::Forest {
            feature_importance, ..
        } => feature_importance.len(),
    }
}
