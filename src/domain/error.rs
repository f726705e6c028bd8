// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure a training or prediction run can surface.
// All variants are fatal to the run that raised them; the
// orchestrator never retries or recovers. The one non-fatal
// condition (stale artifact cleanup) never becomes a ModelError,
// it is logged inside the artifact store instead.
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Recoverable Errors with Result)

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every layer below the CLI.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The dataset identifier did not resolve to a readable table.
    #[error("training data '{identifier}' is unavailable: {reason}")]
    DataUnavailable { identifier: String, reason: String },

    /// Required columns are absent from a dataset.
    #[error("dataset is missing required columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A target cell is missing, not numeric, or outside the domain of
    /// the log transform. `value` is `None` when there was no number.
    #[error("target at row {row} {}", describe_target(.value))]
    InvalidTargetValue { row: usize, value: Option<f64> },

    #[error("pipeline fit failed")]
    TrainingFailed(#[from] FitError),

    #[error("pipeline has not been fitted")]
    NotTrained,

    #[error("cannot persist artifact at '{}': {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("prediction failed: {0}")]
    Inference(String),
}

impl ModelError {
    pub fn data_unavailable(identifier: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            identifier: identifier.into(),
            reason:     reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence {
            path:   path.into(),
            reason: reason.to_string(),
        }
    }
}

fn describe_target(value: &Option<f64>) -> String {
    match value {
        Some(v) => format!("is {v}, which is not strictly positive"),
        None => "is missing or not numeric".to_string(),
    }
}

/// Failures raised while fitting a trainable pipeline.
/// Carried as the source of `ModelError::TrainingFailed`.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {targets} target values")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("feature '{column}' has no observed values")]
    EmptyColumn { column: String },

    #[error("loss became non-finite at epoch {epoch}")]
    Diverged { epoch: usize },

    #[error("tensor error: {0}")]
    Tensor(String),

    #[error("{0}")]
    Other(String),
}
