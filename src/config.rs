use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::aggregate::DayTargetPolicy;
use crate::trainer::ForestParams;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub forest: ForestParams,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AggregationConfig {
    /// How a day's target is derived from multiple same-day captures.
    #[serde(default)]
    pub day_target_policy: DayTargetPolicy,
}

impl TrainingConfig {
    /// Load from a TOML file; a missing file yields the defaults since
    /// every field is optional.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}
