use rand::Rng;
use serde::Deserialize;

use crate::error::TrainError;
use crate::model::{DecisionTree, TrainedModel};

/// Nodes with fewer samples than this become leaves.
const MIN_NODE_SAMPLES: usize = 5;
/// Up to this many evenly spaced thresholds are tested per candidate feature.
const THRESHOLD_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ForestParams {
    #[serde(default = "default_tree_count")]
    pub tree_count: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_tree_count() -> usize {
    50
}

fn default_max_depth() -> usize {
    5
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            tree_count: default_tree_count(),
            max_depth: default_max_depth(),
        }
    }
}

/// Bagged variance-reduction trees with the process-wide RNG. Results are
/// deliberately not reproducible run-to-run; tests needing determinism use
/// [`train_forest_with_rng`] with a seeded generator.
pub fn train_forest(
    features: &[Vec<f64>],
    targets: &[f64],
    params: &ForestParams,
) -> Result<TrainedModel, TrainError> {
    train_forest_with_rng(features, targets, params, &mut rand::thread_rng())
}

pub fn train_forest_with_rng<R: Rng>(
    features: &[Vec<f64>],
    targets: &[f64],
    params: &ForestParams,
    rng: &mut R,
) -> Result<TrainedModel, TrainError> {
    if features.is_empty() || features.len() != targets.len() {
        return Err(TrainError::EmptyTrainingSet);
    }
    let n = features.len();
    // Rows may come from different extractor versions; the widest row
    // defines the feature space and short rows read as 0.0 past their end.
    let dim = features.iter().map(Vec::len).max().unwrap_or(0);

    let mut importance = ImportanceAccumulator::new(dim);
    let mut trees = Vec::with_capacity(params.tree_count);
    for _ in 0..params.tree_count {
        // Bootstrap: N indices drawn uniformly with replacement.
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        trees.push(build_node(
            features,
            targets,
            &indices,
            dim,
            0,
            params,
            &mut importance,
            rng,
        ));
    }

    Ok(TrainedModel::Forest {
        trees,
        feature_importance: importance.normalized(),
    })
}

/// Per-feature variance-reduction totals and winning-split counts across
/// every internal node of every tree.
struct ImportanceAccumulator {
    reduction: Vec<f64>,
    uses: Vec<usize>,
}

impl ImportanceAccumulator {
    fn new(dim: usize) -> Self {
        Self {
            reduction: vec![0.0; dim],
            uses: vec![0; dim],
        }
    }

    fn record(&mut self, feature: usize, reduction: f64) {
        self.reduction[feature] += reduction;
        self.uses[feature] += 1;
    }

    /// Average reduction per use, normalized to sum to one. All-zero when
    /// no tree ever split.
    fn normalized(self) -> Vec<f64> {
        let mut scores: Vec<f64> = self
            .reduction
            .iter()
            .zip(&self.uses)
            .map(|(&sum, &count)| if count == 0 { 0.0 } else { sum / count as f64 })
            .collect();
        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            for s in &mut scores {
                *s /= total;
            }
        }
        scores
    }
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    reduction: f64,
}

fn build_node<R: Rng>(
    features: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    dim: usize,
    depth: usize,
    params: &ForestParams,
    importance: &mut ImportanceAccumulator,
    rng: &mut R,
) -> DecisionTree {
    let node_targets: Vec<f64> = indices.iter().map(|&i| targets[i]).collect();
    let node_mean = mean(&node_targets);

    if depth >= params.max_depth
        || indices.len() < MIN_NODE_SAMPLES
        || node_targets.iter().all(|&t| t == node_targets[0])
    {
        return DecisionTree::Leaf { value: node_mean };
    }

    let Some(split) = best_split(features, targets, indices, dim, rng) else {
        return DecisionTree::Leaf { value: node_mean };
    };
    importance.record(split.feature, split.reduction);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| feature_value(features, i, split.feature) <= split.threshold);

    DecisionTree::Split {
        feature_index: split.feature,
        threshold: split.threshold,
        left: Box::new(build_node(
            features, targets, &left_idx, dim, depth + 1, params, importance, rng,
        )),
        right: Box::new(build_node(
            features, targets, &right_idx, dim, depth + 1, params, importance, rng,
        )),
    }
}

/// Greedy split search over ceil(sqrt(D)) features sampled without
/// replacement for this node only. Returns the single best strictly
/// positive variance reduction, or None when no candidate improves.
fn best_split<R: Rng>(
    features: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    dim: usize,
    rng: &mut R,
) -> Option<SplitChoice> {
    if dim == 0 {
        return None;
    }
    let candidate_count = ((dim as f64).sqrt().ceil() as usize).clamp(1, dim);
    let candidates = rand::seq::index::sample(rng, dim, candidate_count);

    let node_targets: Vec<f64> = indices.iter().map(|&i| targets[i]).collect();
    let parent_variance = variance(&node_targets);
    let total = indices.len() as f64;

    let mut best: Option<SplitChoice> = None;
    for feature in candidates {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| feature_value(features, i, feature))
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let cuts = THRESHOLD_CANDIDATES.min(values.len() - 1);
        for c in 1..=cuts {
            let at = c * values.len() / (cuts + 1);
            if at == 0 || at >= values.len() || values[at - 1] == values[at] {
                continue;
            }
            let threshold = (values[at - 1] + values[at]) / 2.0;

            let mut left = Vec::new();
            let mut right = Vec::new();
            for &i in indices {
                if feature_value(features, i, feature) <= threshold {
                    left.push(targets[i]);
                } else {
                    right.push(targets[i]);
                }
            }
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let weighted_child_variance = (left.len() as f64 * variance(&left)
                + right.len() as f64 * variance(&right))
                / total;
            let reduction = parent_variance - weighted_child_variance;
            if reduction <= 0.0 {
                continue;
            }
            if best.as_ref().map_or(true, |b| reduction > b.reduction) {
                best = Some(SplitChoice {
                    feature,
                    threshold,
                    reduction,
                });
            }
        }
    }
    best
}

/// Short rows read as 0.0 past their end, mirroring the left-routing
/// tolerance at inference time.
fn feature_value(features: &[Vec<f64>], index: usize, feature: usize) -> f64 {
    features[index].get(feature).copied().unwrap_or(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}
