//! JSON layer manifest.
//!
//! SafeTensors files carry no layer structure and store tensors sorted by
//! dtype and name, so the definition order of a model is lost. A manifest
//! restores it, including layers that own no weights:
//!
//! ```json
//! {
//!   "name": "unet",
//!   "layers": [
//!     { "name": "input_1", "class_name": "InputLayer", "weights": [] },
//!     { "name": "conv2d", "class_name": "Conv2D",
//!       "weights": ["conv2d/kernel:0", "conv2d/bias:0"] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Layer structure of a model, deserialized from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub name: Option<String>,
    pub layers: Vec<ManifestLayer>,
}

/// One layer entry of the manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestLayer {
    pub name: String,
    /// Framework class of the layer (`Conv2D`, `BatchNormalization`, ...).
    #[serde(default)]
    pub class_name: Option<String>,
    /// Tensor names in the weights file, in layer order.
    #[serde(default)]
    pub weights: Vec<String>,
}

impl ModelManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Layer names and weight names must each be unique.
    pub fn validate(&self) -> Result<()> {
        let mut layers = HashSet::new();
        let mut weights = HashSet::new();
        for layer in &self.layers {
            if !layers.insert(layer.name.as_str()) {
                return Err(ModelError::InvalidManifest(format!("duplicate layer name '{}'", layer.name)));
            }
            for w in &layer.weights {
                if !weights.insert(w.as_str()) {
                    return Err(ModelError::InvalidManifest(format!("weight '{}' is listed twice", w)));
                }
            }
        }
        Ok(())
    }

    /// Number of weights across all layers.
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len()).sum()
    }
}
