use thiserror::Error;

#[derive(Error, Debug)]
pub enum LsirError {
    #[error("cannot build a matrix from an empty document collection")]
    EmptyCorpus,

    #[error("malformed document {id}: {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("malformed ground truth: {0}")]
    MalformedGroundTruth(String),

    #[error("covariance target must lie in (0, 1], got {0}")]
    InvalidCovariance(f64),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("record format {0} is not supported")]
    UnsupportedFormat(String),

    #[error("singular value decomposition did not converge for a {rows}x{cols} matrix")]
    SvdFailed { rows: usize, cols: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("stored matrix has shape {found:?}, manifest says {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl LsirError {
    /// Input and configuration errors are the caller's fault and never worth retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LsirError::EmptyCorpus
                | LsirError::MalformedDocument { .. }
                | LsirError::MalformedGroundTruth(_)
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LsirError::InvalidCovariance(_)
                | LsirError::UnknownLanguage(_)
                | LsirError::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LsirError>;
