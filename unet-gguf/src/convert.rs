//! Checkpoint to GGUF conversion.

use std::path::PathBuf;

use unet_model::{load_model, TensorExporter};

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::writer::{GgufWriter, TensorEntry};

/// Load the model, export its tensors and write them to a GGUF file.
///
/// Returns the path of the written file.
pub fn convert(config: &ConvertConfig) -> Result<PathBuf> {
    let model = load_model(&config.input)?;
    let tensors = TensorExporter::new().with_progress(config.progress).export(&model)?;

    let output = config.output_path();
    tracing::info!("writing {} tensors to {}", tensors.len(), output.display());
    let mut writer = GgufWriter::create(&output, &config.arch)?;
    writer.set_alignment(config.alignment)?;
    for tensor in tensors {
        writer.add_tensor(TensorEntry::from(tensor))?;
    }

    writer.write_header_to_file()?;
    writer.write_kv_data_to_file()?;
    writer.write_tensors_to_file()?;
    writer.close()?;
    Ok(output)
}
