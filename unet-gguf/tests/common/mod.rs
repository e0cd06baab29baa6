#![allow(dead_code)]

use safetensors::tensor::TensorView;
use safetensors::Dtype;
use std::path::Path;

pub struct TensorInfo {
    pub name: String,
    /// Dimensions as stored, fastest-varying first.
    pub dims: Vec<u64>,
    pub ggml_type: u32,
    pub offset: u64,
}

pub struct ParsedGguf {
    pub version: u32,
    pub kv: Vec<(String, KvValue)>,
    pub tensors: Vec<TensorInfo>,
    pub data_start: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq)]
pub enum KvValue {
    U32(u32),
    Str(String),
}

impl ParsedGguf {
    pub fn tensor_data(&self, name: &str, len: usize) -> &[u8] {
        let t = self.tensors.iter().find(|t| t.name == name).unwrap();
        let start = self.data_start + t.offset as usize;
        &self.bytes[start..start + len]
    }

    pub fn kv(&self, key: &str) -> Option<&KvValue> {
        self.kv.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        out
    }
    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take(4).try_into().unwrap())
    }
    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take(8).try_into().unwrap())
    }
    fn string(&mut self) -> String {
        let len = self.u64() as usize;
        String::from_utf8(self.take(len).to_vec()).unwrap()
    }
}

/// Minimal reader for the subset of GGUF the writer produces.
pub fn parse_gguf(bytes: Vec<u8>) -> ParsedGguf {
    let mut c = Cursor { bytes: &bytes, pos: 0 };
    assert_eq!(c.take(4), b"GGUF");
    let version = c.u32();
    let n_tensors = c.u64();
    let n_kv = c.u64();

    let mut kv = Vec::new();
    let mut alignment = 32u64;
    for _ in 0..n_kv {
        let key = c.string();
        let value = match c.u32() {
            4 => KvValue::U32(c.u32()),
            8 => KvValue::Str(c.string()),
            other => panic!("unexpected kv type {}", other),
        };
        if key == "general.alignment" {
            if let KvValue::U32(a) = value {
                alignment = a as u64;
            }
        }
        kv.push((key, value));
    }

    let mut tensors = Vec::new();
    for _ in 0..n_tensors {
        let name = c.string();
        let n_dims = c.u32();
        let dims = (0..n_dims).map(|_| c.u64()).collect();
        let ggml_type = c.u32();
        let offset = c.u64();
        tensors.push(TensorInfo { name, dims, ggml_type, offset });
    }
    let data_start = (c.pos as u64).div_ceil(alignment) * alignment;
    ParsedGguf { version, kv, tensors, data_start: data_start as usize, bytes }
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn read_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Write f32 tensors as a safetensors file.
pub fn write_safetensors(path: &Path, tensors: &[(&str, Vec<usize>, Vec<f32>)]) {
    let bytes: Vec<Vec<u8>> = tensors.iter().map(|(_, _, v)| f32_bytes(v)).collect();
    let views: Vec<(String, TensorView)> = tensors
        .iter()
        .zip(&bytes)
        .map(|((name, shape, _), b)| (name.to_string(), TensorView::new(Dtype::F32, shape.clone(), b).unwrap()))
        .collect();
    let out = safetensors::serialize(views.iter().map(|(n, v)| (n.clone(), v)), &None).unwrap();
    std::fs::write(path, out).unwrap();
}
