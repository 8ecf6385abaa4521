use crate::model::TrainedModel;

/// Evaluate a trained model against a feature vector. Length mismatches are
/// tolerated in both directions: the linear dot product runs over the
/// common prefix, and tree descent routes left past out-of-range indices.
pub fn predict(model: &TrainedModel, features: &[f64]) -> f64 {
    match model {
        TrainedModel::Linear { bias, coefficients } => {
            bias + coefficients
                .iter()
                .zip(features)
                .map(|(c, f)| c * f)
                .sum::<f64>()
        }
        TrainedModel::Forest { trees, .. } => {
            if trees.is_empty() {
                return 0.0;
            }
            trees.iter().map(|t| t.predict(features)).sum::<f64>() / trees.len() as f64
        }
    }
}
