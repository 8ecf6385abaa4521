use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::model::{CaptureSample, DaySample};

/// How a day's target value is derived when several captures share the day.
/// Both behaviors existed upstream; the policy is an explicit configuration
/// choice, defaulting to the last capture of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTargetPolicy {
    /// Target of the chronologically last capture of the day.
    #[default]
    LastCapture,
    /// Mean of all extracted targets in the day's group.
    MeanOfDay,
}

/// Group raw captures into one training row per calendar day (local date).
/// Captures with an empty feature vector or no extractable target are
/// dropped before grouping. Feature vectors are averaged elementwise;
/// the day's target follows `policy`. Output is ordered by day.
pub fn aggregate_days<F>(
    samples: &[CaptureSample],
    extract: F,
    policy: DayTargetPolicy,
) -> Vec<DaySample>
where
    F: Fn(&std::collections::HashMap<String, String>) -> Option<f64>,
{
    let mut by_day: BTreeMap<NaiveDate, Vec<(&CaptureSample, f64)>> = BTreeMap::new();
    for sample in samples {
        if sample.features.is_empty() {
            continue;
        }
        let Some(target) = extract(&sample.raw_health_fields) else {
            continue;
        };
        let day = sample.captured_at.with_timezone(&Local).date_naive();
        by_day.entry(day).or_default().push((sample, target));
    }

    let mut days = Vec::with_capacity(by_day.len());
    for (day, mut group) in by_day {
        group.sort_by_key(|(s, _)| s.captured_at);

        let dim = group[0].0.features.len();
        let mut features = vec![0.0; dim];
        for (sample, _) in &group {
            for (i, acc) in features.iter_mut().enumerate() {
                *acc += sample.features.get(i).copied().unwrap_or(0.0);
            }
        }
        for acc in &mut features {
            *acc /= group.len() as f64;
        }

        let (last, last_target) = group[group.len() - 1];
        let target = match policy {
            DayTargetPolicy::LastCapture => last_target,
            DayTargetPolicy::MeanOfDay => {
                group.iter().map(|(_, t)| t).sum::<f64>() / group.len() as f64
            }
        };

        days.push(DaySample {
            day,
            features,
            target,
            representative_at: last.captured_at,
            source_capture_ids: group.iter().map(|(s, _)| s.id.clone()).collect(),
        });
    }
    days
}
