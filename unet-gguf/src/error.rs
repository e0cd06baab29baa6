use thiserror::Error;
use unet_model::ModelError;

/// Errors raised while writing a GGUF file or running a conversion.
#[derive(Debug, Error)]
pub enum GgufError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("duplicated tensor name '{0}'")]
    DuplicateTensor(String),

    #[error("duplicated metadata key '{0}'")]
    DuplicateKey(String),

    #[error("expected writer state {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GgufError>;
