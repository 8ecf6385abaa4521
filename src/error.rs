use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("insufficient data: need {required} day samples, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("normal equations are singular: pivot magnitude fell below tolerance")]
    SingularMatrix,

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("training task failed: {0}")]
    Task(String),
}
