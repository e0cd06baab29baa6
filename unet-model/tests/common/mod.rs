#![allow(dead_code)]

use safetensors::tensor::TensorView;
use safetensors::Dtype;
use std::path::Path;

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Write `(name, dtype, shape, bytes)` entries as a safetensors file.
pub fn write_raw(path: &Path, tensors: &[(&str, Dtype, Vec<usize>, Vec<u8>)]) {
    let views: Vec<(String, TensorView)> = tensors
        .iter()
        .map(|(name, dtype, shape, bytes)| {
            (name.to_string(), TensorView::new(*dtype, shape.clone(), bytes).unwrap())
        })
        .collect();
    let out = safetensors::serialize(views.iter().map(|(n, v)| (n.clone(), v)), &None).unwrap();
    std::fs::write(path, out).unwrap();
}

/// Write f32 tensors as a safetensors file.
pub fn write_f32(path: &Path, tensors: &[(&str, Vec<usize>, Vec<f32>)]) {
    let raw: Vec<(&str, Dtype, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, shape, values)| (*name, Dtype::F32, shape.clone(), f32_bytes(values)))
        .collect();
    write_raw(path, &raw);
}

pub fn read_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
