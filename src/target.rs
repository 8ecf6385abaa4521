use std::collections::HashMap;

pub const SLEEP_MINUTES_KEY: &str = "sleep_minutes";
pub const DEEP_SLEEP_MINUTES_KEY: &str = "deep_sleep_minutes";
pub const REM_SLEEP_MINUTES_KEY: &str = "rem_sleep_minutes";
pub const TIME_IN_BED_MINUTES_KEY: &str = "time_in_bed_minutes";
pub const HRV_KEY: &str = "hrv_ms";
pub const RESTING_HEART_RATE_KEY: &str = "resting_heart_rate";

/// Which physiological value a model is trained against. `Custom` parses an
/// arbitrary health field as a number, for user-defined targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    SleepScore,
    HeartRateVariability,
    RestingHeartRate,
    Custom(String),
}

impl TargetKind {
    /// Stable identifier used as the model storage key.
    pub fn id(&self) -> &str {
        match self {
            TargetKind::SleepScore => "sleep_score",
            TargetKind::HeartRateVariability => "hrv",
            TargetKind::RestingHeartRate => "resting_heart_rate",
            TargetKind::Custom(key) => key,
        }
    }

    /// Extract the target value for one capture's health fields. `None`
    /// means the capture carries no usable ground truth and is dropped
    /// before day aggregation.
    pub fn extract(&self, fields: &HashMap<String, String>) -> Option<f64> {
        match self {
            TargetKind::SleepScore => sleep_score(fields),
            TargetKind::HeartRateVariability => parse_field(fields, HRV_KEY),
            TargetKind::RestingHeartRate => parse_field(fields, RESTING_HEART_RATE_KEY),
            TargetKind::Custom(key) => parse_field(fields, key),
        }
    }
}

fn parse_field(fields: &HashMap<String, String>, key: &str) -> Option<f64> {
    fields.get(key).and_then(|v| v.trim().parse::<f64>().ok())
}

/// Composite 0-100 sleep score: duration (40), deep sleep (30), REM (20)
/// and time-in-bed efficiency (10), each component capped at its weight.
/// Reference amounts: 8h sleep, 96min deep, 108min REM, full efficiency.
fn sleep_score(fields: &HashMap<String, String>) -> Option<f64> {
    let sleep_minutes = parse_field(fields, SLEEP_MINUTES_KEY)?;

    let duration = (sleep_minutes / 480.0).min(1.0) * 40.0;
    let deep = parse_field(fields, DEEP_SLEEP_MINUTES_KEY)
        .map(|m| (m / 96.0).min(1.0) * 30.0)
        .unwrap_or(0.0);
    let rem = parse_field(fields, REM_SLEEP_MINUTES_KEY)
        .map(|m| (m / 108.0).min(1.0) * 20.0)
        .unwrap_or(0.0);
    let efficiency = parse_field(fields, TIME_IN_BED_MINUTES_KEY)
        .filter(|&in_bed| in_bed > 0.0)
        .map(|in_bed| (sleep_minutes / in_bed).min(1.0) * 10.0)
        .unwrap_or(0.0);

    Some(duration + deep + rem + efficiency)
}
