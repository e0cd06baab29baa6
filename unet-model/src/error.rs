//! Error type shared by the loader and the exporter.

use thiserror::Error;

/// Errors produced while loading a model or exporting its tensors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("weight '{0}' is listed in the manifest but missing from the weights file")]
    MissingWeight(String),

    #[error("weight '{name}' has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("weight '{name}': shape {shape:?} needs {expected} elements, buffer holds {actual}")]
    ShapeMismatch {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
