use std::fmt;

/// Element type of a weight tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F16,
    BF16,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
}

impl DType {
    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            DType::I8 | DType::U8 => 1,
            DType::F16 | DType::BF16 | DType::I16 => 2,
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    /// Map a safetensors dtype tag, `None` for tags we cannot export.
    pub fn from_safetensors(dtype: safetensors::Dtype) -> Option<Self> {
        use safetensors::Dtype as St;
        match dtype {
            St::F32 => Some(DType::F32),
            St::F16 => Some(DType::F16),
            St::BF16 => Some(DType::BF16),
            St::F64 => Some(DType::F64),
            St::I8 => Some(DType::I8),
            St::I16 => Some(DType::I16),
            St::I32 => Some(DType::I32),
            St::I64 => Some(DType::I64),
            St::U8 => Some(DType::U8),
            _ => None,
        }
    }

    /// Short name as printed in progress output (`float32`, `int8`, ...).
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F64 => "float64",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
