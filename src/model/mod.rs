pub mod sample;
pub mod trained;

pub use sample::{CaptureSample, DaySample, FEATURE_COUNT};
pub use trained::{DecisionTree, ModelKind, ModelMetadata, Snapshot, TrainedModel};
