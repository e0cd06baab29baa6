//! Model loading from SafeTensors checkpoints.
//!
//! Accepted inputs:
//! - a directory holding `model.json` (see [`ModelManifest`]) and
//!   `model.safetensors`;
//! - a `.safetensors` file, with an optional manifest next to it under the
//!   same stem (`unet.safetensors` + `unet.json`);
//! - a bare `.safetensors` file. Layers are then inferred from tensor names
//!   and ordered by where their tensors sit in the file.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;
use safetensors::SafeTensors;

use crate::dtype::DType;
use crate::error::{ModelError, Result};
use crate::manifest::ModelManifest;
use crate::model::{Layer, Model, Weight};

/// Manifest filename inside a model directory.
pub const MANIFEST_FILE: &str = "model.json";

/// Weights filename inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Loads a [`Model`] from disk.
pub struct ModelLoader;

impl ModelLoader {
    pub fn load(path: &Path) -> Result<Model> {
        let (weights_path, manifest_path) = resolve(path)?;
        let manifest = match manifest_path {
            Some(p) => {
                tracing::info!("reading manifest {}", p.display());
                Some(ModelManifest::from_file(&p)?)
            }
            None => {
                tracing::warn!(
                    "no manifest for {}, inferring layers from tensor names",
                    weights_path.display()
                );
                None
            }
        };

        tracing::info!("loading weights {}", weights_path.display());
        let file = File::open(&weights_path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let tensors = SafeTensors::deserialize(&mmap)?;

        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let model = match manifest {
            Some(m) => {
                let name = m.name.clone().unwrap_or(default_name);
                Model::new(name, layers_from_manifest(&m, &tensors)?)
            }
            None => Model::new(default_name, layers_from_offsets(&mmap, &tensors)?),
        };
        tracing::info!(
            "loaded model '{}': {} layers, {} weights",
            model.name,
            model.layers.len(),
            model.weight_count()
        );
        Ok(model)
    }
}

/// Load a model, see [`ModelLoader::load`].
pub fn load_model(path: impl AsRef<Path>) -> Result<Model> {
    ModelLoader::load(path.as_ref())
}

/// Returns the weights file and the manifest to use with it, if any.
fn resolve(path: &Path) -> Result<(PathBuf, Option<PathBuf>)> {
    if path.is_dir() {
        let manifest = path.join(MANIFEST_FILE);
        let manifest = manifest.is_file().then_some(manifest);
        return Ok((path.join(WEIGHTS_FILE), manifest));
    }
    if !path.exists() {
        return Err(ModelError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("model file not found: {}", path.display()),
        )));
    }
    let sibling = path.with_extension("json");
    let manifest = (sibling != path && sibling.is_file()).then_some(sibling);
    Ok((path.to_path_buf(), manifest))
}

fn read_weight(tensors: &SafeTensors<'_>, name: &str) -> Result<Weight> {
    let view = tensors.tensor(name).map_err(|e| match e {
        safetensors::SafeTensorError::TensorNotFound(_) => ModelError::MissingWeight(name.to_string()),
        other => other.into(),
    })?;
    let dtype = DType::from_safetensors(view.dtype()).ok_or_else(|| ModelError::UnsupportedDtype {
        name: name.to_string(),
        dtype: format!("{:?}", view.dtype()),
    })?;
    Weight::new(name, view.shape().to_vec(), dtype, view.data().to_vec())
}

fn layers_from_manifest(manifest: &ModelManifest, tensors: &SafeTensors<'_>) -> Result<Vec<Layer>> {
    let mut layers = Vec::with_capacity(manifest.layers.len());
    for entry in &manifest.layers {
        let weights = entry
            .weights
            .iter()
            .map(|w| read_weight(tensors, w))
            .collect::<Result<Vec<_>>>()?;
        layers.push(Layer::new(entry.name.clone(), weights));
    }
    let listed = manifest.weight_count();
    if listed < tensors.len() {
        tracing::warn!("{} tensors in the weights file are not listed in the manifest", tensors.len() - listed);
    }
    Ok(layers)
}

fn layers_from_offsets(buffer: &[u8], tensors: &SafeTensors<'_>) -> Result<Vec<Layer>> {
    let (_, metadata) = SafeTensors::read_metadata(buffer)?;
    let mut names: Vec<(usize, String)> = metadata
        .tensors()
        .into_iter()
        .map(|(name, info)| (info.data_offsets.0, name))
        .collect();
    names.sort();

    let mut layers: Vec<Layer> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (_, name) in names {
        let weight = read_weight(tensors, &name)?;
        let layer = layer_name(&name).to_string();
        match index.get(&layer) {
            Some(&i) => layers[i].weights.push(weight),
            None => {
                index.insert(layer.clone(), layers.len());
                layers.push(Layer::new(layer, vec![weight]));
            }
        }
    }
    Ok(layers)
}

/// Layer that owns a tensor: the part of its name before the last `/`
/// (`conv2d/kernel:0`), else before the last `.` (`down1.conv.weight`).
pub fn layer_name(tensor: &str) -> &str {
    tensor
        .rsplit_once('/')
        .or_else(|| tensor.rsplit_once('.'))
        .map(|(layer, _)| layer)
        .unwrap_or(tensor)
}
