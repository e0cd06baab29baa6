//! Tensor extraction: turns a loaded [`Model`] into the ordered list of
//! tensors handed to the container writer.

use crate::dtype::DType;
use crate::error::{ModelError, Result};
use crate::model::{Model, Weight};
use crate::transform::{normalized_shape, transform_bytes};

/// A weight after reshape and axis reversal, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedTensor {
    pub name: String,
    /// Row-major shape of `data`.
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub data: Vec<u8>,
}

/// Walks a model's layers and exports every weight.
#[derive(Clone, Debug)]
pub struct TensorExporter {
    progress: bool,
}

impl Default for TensorExporter {
    fn default() -> Self {
        Self { progress: true }
    }
}

impl TensorExporter {
    /// Exporter that prints progress to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the stdout progress lines.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Export all weights, layers and weights in definition order.
    ///
    /// Layers without weights contribute nothing.
    pub fn export(&self, model: &Model) -> Result<Vec<ExportedTensor>> {
        let mut out = Vec::with_capacity(model.weight_count());
        for layer in &model.layers {
            if layer.weights.is_empty() {
                tracing::debug!(layer = %layer.name, "skipping layer without weights");
                continue;
            }
            if self.progress {
                println!("   Layer has {} weights", layer.weights.len());
            }
            for weight in &layer.weights {
                out.push(self.export_weight(weight)?);
            }
        }
        Ok(out)
    }

    fn export_weight(&self, weight: &Weight) -> Result<ExportedTensor> {
        if self.progress {
            println!("  [{}] {} {}", weight.name, format_shape(&weight.shape), weight.dtype);
            if weight.rank() == 1 {
                println!(
                    "  after transpose: [{}] {} {}",
                    weight.name,
                    format_shape(&normalized_shape(&weight.shape)),
                    weight.dtype
                );
            }
        }
        let (shape, data) = transform_bytes(&weight.shape, weight.dtype, &weight.data)
            .map_err(|e| match e {
                ModelError::ShapeMismatch { shape, expected, actual, .. } => ModelError::ShapeMismatch {
                    name: weight.name.clone(),
                    shape,
                    expected,
                    actual,
                },
                other => other,
            })?;
        tracing::debug!(name = %weight.name, from = ?weight.shape, to = ?shape, "exported tensor");
        Ok(ExportedTensor { name: weight.name.clone(), shape, dtype: weight.dtype, data })
    }
}

/// Export with progress output enabled.
pub fn export(model: &Model) -> Result<Vec<ExportedTensor>> {
    TensorExporter::new().export(model)
}

/// Format a shape the way the progress output shows it: `(3, 3, 1, 16)`,
/// `(16,)` for vectors, `()` for scalars.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [len] => format!("({},)", len),
        _ => {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    }
}
