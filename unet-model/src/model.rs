use crate::dtype::DType;
use crate::error::{ModelError, Result};

/// A single named parameter tensor owned by a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Weight {
    /// Unique name, used as the key of the exported tensor.
    pub name: String,
    /// Row-major shape; empty for a scalar.
    pub shape: Vec<usize>,
    pub dtype: DType,
    /// Little-endian element bytes in row-major order.
    pub data: Vec<u8>,
}

impl Weight {
    /// Create a weight, checking that `data` matches `shape` and `dtype`.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, dtype: DType, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let expected = shape.iter().product::<usize>();
        let actual = data.len() / dtype.element_size();
        if data.len() % dtype.element_size() != 0 || actual != expected {
            return Err(ModelError::ShapeMismatch { name, shape, expected, actual });
        }
        Ok(Self { name, shape, dtype, data })
    }

    /// Convenience constructor for `f32` data.
    pub fn from_f32(name: impl Into<String>, shape: Vec<usize>, values: &[f32]) -> Result<Self> {
        Self::new(name, shape, DType::F32, bytemuck::cast_slice(values).to_vec())
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Named grouping of weights, in definition order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    pub name: String,
    pub weights: Vec<Weight>,
}

impl Layer {
    pub fn new(name: impl Into<String>, weights: Vec<Weight>) -> Self {
        Self { name: name.into(), weights }
    }
}

/// Loaded model: an ordered sequence of layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub name: String,
    pub layers: Vec<Layer>,
}

impl Model {
    pub fn new(name: impl Into<String>, layers: Vec<Layer>) -> Self {
        Self { name: name.into(), layers }
    }

    /// Iterate every weight in layer order.
    pub fn weights(&self) -> impl Iterator<Item = &Weight> {
        self.layers.iter().flat_map(|l| l.weights.iter())
    }

    /// Total number of weights across all layers.
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len()).sum()
    }
}
