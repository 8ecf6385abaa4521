pub mod forest;
pub mod linear;
pub mod validate;

pub use forest::{train_forest, train_forest_with_rng, ForestParams};
pub use linear::train_linear;
pub use validate::{cross_validate, FoldOutcome, ValidationReport, MIN_TRAINING_DAYS};

use crate::error::TrainError;
use crate::model::{ModelKind, TrainedModel};

/// Fit one model of the requested family on the full matrix. The forest
/// path draws from the process-wide RNG; seeded fits go through
/// [`forest::train_forest_with_rng`] directly.
pub fn fit_model(
    kind: ModelKind,
    features: &[Vec<f64>],
    targets: &[f64],
    params: &ForestParams,
) -> Result<TrainedModel, TrainError> {
    match kind {
        ModelKind::Linear => linear::train_linear(features, targets),
        ModelKind::Forest => forest::train_forest(features, targets, params),
    }
}
