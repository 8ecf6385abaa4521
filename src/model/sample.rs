use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Feature vector length produced by the reference face extractor:
/// eye/brow/mouth/cheek expression intensities, three composite indicator
/// scores, and three head-pose angles rescaled into 0..1.
pub const FEATURE_COUNT: usize = 24;

/// One raw capture as handed over by the camera/health collaborators.
/// Immutable once created; the trainer never stores these itself.
#[derive(Debug, Clone)]
pub struct CaptureSample {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub features: Vec<f64>,
    /// String-encoded health fields for the capture's day, as supplied by
    /// the health-data provider (e.g. "sleep_minutes" -> "462").
    pub raw_health_fields: HashMap<String, String>,
}

/// One row of training data representing a calendar day. Built by the day
/// aggregator, consumed by the trainers, never persisted.
#[derive(Debug, Clone)]
pub struct DaySample {
    pub day: NaiveDate,
    pub features: Vec<f64>,
    pub target: f64,
    pub representative_at: DateTime<Utc>,
    pub source_capture_ids: Vec<String>,
}
