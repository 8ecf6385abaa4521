use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Forest,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Linear => write!(f, "linear"),
            ModelKind::Forest => write!(f, "forest"),
        }
    }
}

/// A regression tree node. Children are exclusively owned, so the whole
/// tree is a plain value type that serializes as nested JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionTree {
    Leaf {
        value: f64,
    },
    Split {
        feature_index: usize,
        threshold: f64,
        left: Box<DecisionTree>,
        right: Box<DecisionTree>,
    },
}

impl DecisionTree {
    /// Descend to a leaf. A feature index beyond the end of the vector
    /// routes left, so a persisted model keeps working when the feature
    /// extractor schema has since shrunk.
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            DecisionTree::Leaf { value } => *value,
            DecisionTree::Split {
                feature_index,
                threshold,
                left,
                right,
            } => match features.get(*feature_index) {
                Some(v) if *v > *threshold => right.predict(features),
                _ => left.predict(features),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    Linear {
        bias: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<DecisionTree>,
        feature_importance: Vec<f64>,
    },
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Linear { .. } => ModelKind::Linear,
            TrainedModel::Forest { .. } => ModelKind::Forest,
        }
    }
}

/// Persisted alongside every model; overwritten on retrain. `correlation`
/// is always the leave-one-day-out cross-validation figure, never an
/// in-sample number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub target_id: String,
    pub correlation: f64,
    pub trained_at: DateTime<Utc>,
    pub feature_count: usize,
    pub model_kind: ModelKind,
}

/// Manifest of a named snapshot: which targets' model+metadata pairs were
/// copied into the snapshot folder at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub target_ids: Vec<String>,
}
