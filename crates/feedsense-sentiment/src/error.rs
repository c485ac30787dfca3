use thiserror::Error;

/// Failure to bring up a [`ModelBundle`](crate::ModelBundle).
///
/// Always fatal: a process without a bundle cannot serve any request.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found: {path}")]
    NotFound { path: String },

    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact {path} is incompatible: {reason}")]
    Incompatible { path: String, reason: String },

    #[error(
        "vectorizer produces {vectorizer} features but classifier expects {classifier}"
    )]
    DimensionMismatch { vectorizer: usize, classifier: usize },
}

/// Unrecoverable failure while transforming or predicting one text.
///
/// Ordinary text (including the empty string) never produces this.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("feature vector has {actual} dimensions, classifier expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },

    #[error("vectorizer failed: {0}")]
    Transform(String),
}

/// Rejection of an uploaded table before any inference runs.
#[derive(Debug, Error)]
pub enum BatchValidationError {
    #[error("the uploaded CSV file must contain a column named '{}'", crate::table::FEEDBACK_COLUMN)]
    MissingFeedbackColumn,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has {actual} rows; at most {max} are accepted per upload")]
    TooManyRows { max: usize, actual: usize },
}
