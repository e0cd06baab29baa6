//! Staged GGUF v3 writer.
//!
//! Tensors and metadata are collected first, then the file is produced in
//! fixed stages: header, key/value data, tensor infos and payloads, close.
//! Each stage checks that the previous one has run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use unet_model::{DType, ExportedTensor};

use crate::error::{GgufError, Result};

pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";
pub const GGUF_VERSION: u32 = 3;
pub const DEFAULT_ALIGNMENT: u32 = 32;

pub const KEY_ARCHITECTURE: &str = "general.architecture";
pub const KEY_ALIGNMENT: &str = "general.alignment";

/// ggml tensor element types used by this writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorDType {
    F32,
    F16,
    BF16,
    F64,
    I8,
    I16,
    I32,
    I64,
}

impl TensorDType {
    pub fn as_gguf_type(self) -> u32 {
        match self {
            TensorDType::F32 => 0,
            TensorDType::F16 => 1,
            TensorDType::I8 => 24,
            TensorDType::I16 => 25,
            TensorDType::I32 => 26,
            TensorDType::I64 => 27,
            TensorDType::F64 => 28,
            TensorDType::BF16 => 30,
        }
    }

    pub fn element_size(self) -> usize {
        match self {
            TensorDType::I8 => 1,
            TensorDType::F16 | TensorDType::BF16 | TensorDType::I16 => 2,
            TensorDType::F32 | TensorDType::I32 => 4,
            TensorDType::F64 | TensorDType::I64 => 8,
        }
    }
}

impl From<DType> for TensorDType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::F32 => TensorDType::F32,
            DType::F16 => TensorDType::F16,
            DType::BF16 => TensorDType::BF16,
            DType::F64 => TensorDType::F64,
            // ggml has no unsigned byte type, the bit pattern is kept
            DType::I8 | DType::U8 => TensorDType::I8,
            DType::I16 => TensorDType::I16,
            DType::I32 => TensorDType::I32,
            DType::I64 => TensorDType::I64,
        }
    }
}

/// Typed metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    Bool(bool),
    String(String),
    U64(u64),
    I64(i64),
    F64(f64),
}

impl MetadataValue {
    /// GGUF value type id.
    pub fn type_id(&self) -> u32 {
        match self {
            MetadataValue::U8(_) => 0,
            MetadataValue::I8(_) => 1,
            MetadataValue::U16(_) => 2,
            MetadataValue::I16(_) => 3,
            MetadataValue::U32(_) => 4,
            MetadataValue::I32(_) => 5,
            MetadataValue::F32(_) => 6,
            MetadataValue::Bool(_) => 7,
            MetadataValue::String(_) => 8,
            MetadataValue::U64(_) => 10,
            MetadataValue::I64(_) => 11,
            MetadataValue::F64(_) => 12,
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            MetadataValue::U8(v) => buf.push(*v),
            MetadataValue::I8(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::Bool(v) => buf.push(*v as u8),
            MetadataValue::String(s) => encode_str(buf, s),
            MetadataValue::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MetadataValue::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

fn encode_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// A tensor queued for writing.
#[derive(Clone, Debug)]
pub struct TensorEntry {
    pub name: String,
    /// Row-major shape of `data`.
    pub shape: Vec<u64>,
    pub dtype: TensorDType,
    pub data: Vec<u8>,
}

impl TensorEntry {
    pub fn new(name: String, shape: Vec<u64>, dtype: TensorDType, data: Vec<u8>) -> Self {
        Self { name, shape, dtype, data }
    }
}

impl From<ExportedTensor> for TensorEntry {
    fn from(t: ExportedTensor) -> Self {
        let shape = t.shape.iter().map(|&d| d as u64).collect();
        Self::new(t.name, shape, t.dtype.into(), t.data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriterState {
    Empty,
    Header,
    KvData,
    Tensors,
}

impl WriterState {
    fn name(self) -> &'static str {
        match self {
            WriterState::Empty => "empty",
            WriterState::Header => "header",
            WriterState::KvData => "kv-data",
            WriterState::Tensors => "tensors",
        }
    }
}

/// GGUF writer over any byte sink.
pub struct GgufWriter<W: Write> {
    out: W,
    position: u64,
    alignment: u32,
    metadata: Vec<(String, MetadataValue)>,
    tensors: Vec<TensorEntry>,
    state: WriterState,
}

impl GgufWriter<BufWriter<File>> {
    /// Create `path` and a writer labelled with the model kind `arch`.
    pub fn create(path: &Path, arch: &str) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), arch))
    }
}

impl<W: Write> GgufWriter<W> {
    pub fn new(out: W, arch: &str) -> Self {
        Self {
            out,
            position: 0,
            alignment: DEFAULT_ALIGNMENT,
            metadata: vec![(KEY_ARCHITECTURE.to_string(), MetadataValue::String(arch.to_string()))],
            tensors: Vec::new(),
            state: WriterState::Empty,
        }
    }

    /// Set the data alignment. Only non-default values are stored as
    /// `general.alignment`.
    pub fn set_alignment(&mut self, alignment: u32) -> Result<()> {
        self.expect_state(WriterState::Empty)?;
        self.alignment = alignment.max(1);
        self.metadata.retain(|(k, _)| k != KEY_ALIGNMENT);
        if self.alignment != DEFAULT_ALIGNMENT {
            self.metadata.push((KEY_ALIGNMENT.to_string(), MetadataValue::U32(self.alignment)));
        }
        Ok(())
    }

    pub fn add_metadata(&mut self, key: &str, value: MetadataValue) -> Result<()> {
        self.expect_state(WriterState::Empty)?;
        if self.metadata.iter().any(|(k, _)| k == key) {
            return Err(GgufError::DuplicateKey(key.to_string()));
        }
        self.metadata.push((key.to_string(), value));
        Ok(())
    }

    pub fn add_tensor(&mut self, tensor: TensorEntry) -> Result<()> {
        self.expect_state(WriterState::Empty)?;
        if self.tensors.iter().any(|t| t.name == tensor.name) {
            return Err(GgufError::DuplicateTensor(tensor.name));
        }
        tracing::debug!(name = %tensor.name, shape = ?tensor.shape, dtype = ?tensor.dtype, "queued tensor");
        self.tensors.push(tensor);
        Ok(())
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn metadata(&self) -> &[(String, MetadataValue)] {
        &self.metadata
    }

    /// Magic, version, tensor count and key/value count.
    pub fn write_header_to_file(&mut self) -> Result<()> {
        self.expect_state(WriterState::Empty)?;
        let mut buf = Vec::with_capacity(24);
        buf.extend_from_slice(&GGUF_MAGIC);
        buf.extend_from_slice(&GGUF_VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.tensors.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(self.metadata.len() as u64).to_le_bytes());
        self.write_bytes(&buf)?;
        self.state = WriterState::Header;
        tracing::info!("wrote header: {} tensors, {} kv pairs", self.tensors.len(), self.metadata.len());
        Ok(())
    }

    pub fn write_kv_data_to_file(&mut self) -> Result<()> {
        self.expect_state(WriterState::Header)?;
        let mut buf = Vec::new();
        for (key, value) in &self.metadata {
            encode_str(&mut buf, key);
            buf.extend_from_slice(&value.type_id().to_le_bytes());
            value.encode(&mut buf);
        }
        self.write_bytes(&buf)?;
        self.state = WriterState::KvData;
        Ok(())
    }

    /// Tensor infos, padding, then every payload padded to the alignment.
    pub fn write_tensors_to_file(&mut self) -> Result<()> {
        self.expect_state(WriterState::KvData)?;
        let align = self.alignment as u64;

        let mut info = Vec::new();
        let mut offset = 0u64;
        for t in &self.tensors {
            encode_str(&mut info, &t.name);
            info.extend_from_slice(&(t.shape.len() as u32).to_le_bytes());
            // ggml lists dimensions fastest-varying first
            for dim in t.shape.iter().rev() {
                info.extend_from_slice(&dim.to_le_bytes());
            }
            info.extend_from_slice(&t.dtype.as_gguf_type().to_le_bytes());
            info.extend_from_slice(&offset.to_le_bytes());
            offset += pad_to(t.data.len() as u64, align);
        }
        self.write_bytes(&info)?;
        self.write_padding()?;

        let tensors = std::mem::take(&mut self.tensors);
        for t in &tensors {
            self.write_bytes(&t.data)?;
            self.write_padding()?;
            tracing::debug!(name = %t.name, bytes = t.data.len(), "wrote tensor data");
        }
        self.tensors = tensors;
        self.state = WriterState::Tensors;
        tracing::info!("wrote {} tensors, {} bytes total", self.tensors.len(), self.position);
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn close(mut self) -> Result<W> {
        self.expect_state(WriterState::Tensors)?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn expect_state(&self, expected: WriterState) -> Result<()> {
        if self.state != expected {
            return Err(GgufError::InvalidState { expected: expected.name(), found: self.state.name() });
        }
        Ok(())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.out.write_all(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn write_padding(&mut self) -> Result<()> {
        let padded = pad_to(self.position, self.alignment as u64);
        let zeros = vec![0u8; (padded - self.position) as usize];
        self.write_bytes(&zeros)
    }
}

/// Round `n` up to a multiple of `align`.
pub fn pad_to(n: u64, align: u64) -> u64 {
    n.div_ceil(align) * align
}
