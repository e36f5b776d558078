use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feedback record malformed: {0}")]
    MalformedFeedback(String),
    #[error("model file is corrupt: {0}")]
    CorruptModel(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;
