//! Model representation and tensor export used by the `convert` binary.
//!
//! A checkpoint is loaded into typed [`Model`]/[`Layer`]/[`Weight`] records,
//! then [`TensorExporter`] turns every weight into an [`ExportedTensor`]:
//! vectors are viewed as `(1, 1, N, 1)` and all tensors have their axes
//! reversed before they are handed to the container writer.

pub mod dtype;
pub mod error;
pub mod export;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod transform;

pub use dtype::DType;
pub use error::ModelError;
pub use export::{export, ExportedTensor, TensorExporter};
pub use loader::{load_model, ModelLoader};
pub use manifest::ModelManifest;
pub use model::{Layer, Model, Weight};
