use std::path::PathBuf;

use crate::writer::DEFAULT_ALIGNMENT;

/// Input used when none is given on the command line.
pub const DEFAULT_MODEL: &str = "modelunet.safetensors";

/// Model-kind label stored as `general.architecture`.
pub const DEFAULT_ARCH: &str = "Unet";

/// Extension appended to the input path to name the output.
pub const OUTPUT_EXTENSION: &str = "gguf";

/// Settings for one conversion run.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Model file or directory to read.
    pub input: PathBuf,
    /// Output path; `<input>.gguf` when unset.
    pub output: Option<PathBuf>,
    pub arch: String,
    pub alignment: u32,
    /// Print per-layer progress to stdout.
    pub progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_MODEL),
            output: None,
            arch: DEFAULT_ARCH.to_string(),
            alignment: DEFAULT_ALIGNMENT,
            progress: true,
        }
    }
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self { input: input.into(), ..Self::default() }
    }

    /// Where the converted file goes.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(p) => p.clone(),
            None => {
                let mut name = self.input.clone().into_os_string();
                name.push(".");
                name.push(OUTPUT_EXTENSION);
                PathBuf::from(name)
            }
        }
    }
}
