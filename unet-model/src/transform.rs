//! Shape normalisation and axis reversal applied to every exported weight.
//!
//! Rank-1 tensors are first viewed as `(1, 1, N, 1)`. Every tensor then has
//! its axes reversed, so the element at output index `(i0, .., iR-1)` is the
//! input element at `(iR-1, .., i0)`. The result is materialised in
//! row-major order.

use ndarray::{ArrayViewD, IxDyn};

use crate::dtype::DType;
use crate::error::{ModelError, Result};

/// Shape after the rank-1 reshape; other ranks pass through.
pub fn normalized_shape(shape: &[usize]) -> Vec<usize> {
    match shape {
        [len] => vec![1, 1, *len, 1],
        _ => shape.to_vec(),
    }
}

/// Reshape rank-1 input to `(1, 1, N, 1)`, then reverse all axes.
///
/// Returns the output shape and the elements in row-major order of that
/// shape.
pub fn transform<T: Clone>(shape: &[usize], data: &[T]) -> Result<(Vec<usize>, Vec<T>)> {
    let expected = shape.iter().product::<usize>();
    if data.len() != expected {
        return Err(ModelError::ShapeMismatch {
            name: String::new(),
            shape: shape.to_vec(),
            expected,
            actual: data.len(),
        });
    }
    let shape = normalized_shape(shape);
    let view = ArrayViewD::from_shape(IxDyn(&shape), data).map_err(|_| ModelError::ShapeMismatch {
        name: String::new(),
        shape: shape.clone(),
        expected,
        actual: data.len(),
    })?;
    let reversed = view.reversed_axes();
    let out_shape = reversed.shape().to_vec();
    Ok((out_shape, reversed.iter().cloned().collect()))
}

/// Byte-level [`transform`] for a buffer of `dtype` elements.
///
/// Elements are moved as opaque words of the dtype's width, so values are
/// carried bit for bit.
pub fn transform_bytes(shape: &[usize], dtype: DType, bytes: &[u8]) -> Result<(Vec<usize>, Vec<u8>)> {
    let elem = dtype.element_size();
    if bytes.len() % elem != 0 {
        return Err(ModelError::ShapeMismatch {
            name: String::new(),
            shape: shape.to_vec(),
            expected: shape.iter().product(),
            actual: bytes.len() / elem,
        });
    }
    match elem {
        1 => transform(shape, bytes),
        2 => transform_words::<u16>(shape, bytes),
        4 => transform_words::<u32>(shape, bytes),
        _ => transform_words::<u64>(shape, bytes),
    }
}

fn transform_words<W: bytemuck::Pod>(shape: &[usize], bytes: &[u8]) -> Result<(Vec<usize>, Vec<u8>)> {
    // copy into an aligned buffer, mmapped input has no alignment guarantee
    let words: Vec<W> = bytemuck::pod_collect_to_vec(bytes);
    let (out_shape, out) = transform(shape, &words)?;
    Ok((out_shape, bytemuck::cast_slice(&out).to_vec()))
}
