use thiserror::Error;

/// Errors raised by the metric core.
///
/// Loaders and the binary wrap these in `anyhow` with file context.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("empty instance set: the filter selected no instances")]
    EmptyInstanceSet,

    #[error("malformed trace for {label} on {dataset}/{path}: {reason}")]
    MalformedTrace {
        dataset: String,
        path: String,
        label: String,
        reason: String,
    },

    #[error("invalid time grid: {0}")]
    InvalidGrid(String),

    #[error("invalid reference row {dataset}/{path}: {reason}")]
    InvalidReference {
        dataset: String,
        path: String,
        reason: String,
    },

    #[error("filter error at offset {offset}: {message}")]
    Filter { offset: usize, message: String },

    #[error("malformed output file {file}: {reason}")]
    MalformedOutput { file: String, reason: String },

    #[error("instance {instance} carries labels {found:?}, expected {expected:?}")]
    LabelMismatch {
        instance: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("expected {expected} instances, folded {folded}")]
    InstanceCountMismatch { expected: usize, folded: usize },
}
