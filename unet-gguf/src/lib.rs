//! GGUF output for exported model tensors.
//!
//! [`convert`] drives the whole pipeline; [`writer::GgufWriter`] is usable on
//! its own for any set of tensors.

pub mod config;
pub mod convert;
pub mod error;
pub mod writer;

pub use config::ConvertConfig;
pub use convert::convert;
pub use error::GgufError;
pub use writer::{GgufWriter, MetadataValue, TensorDType, TensorEntry};
