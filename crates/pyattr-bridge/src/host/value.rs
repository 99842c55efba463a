//! Host Value Builders
//!
//! [`HostValue`] describes an object tree to be allocated in a
//! [`MemoryHost`](super::memory::MemoryHost): scalars, sequences, typed
//! arrays and attribute-bearing instances. It plays the part of the host
//! program that creates the objects the bridge later reads.

use std::fmt;
use std::ptr::NonNull;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::dtype::DType;

/// Typed element storage of a host array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayBuffer {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl ArrayBuffer {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayBuffer::Bool(_) => DType::Bool,
            ArrayBuffer::Int32(_) => DType::Int32,
            ArrayBuffer::Int64(_) => DType::Int64,
            ArrayBuffer::Float32(_) => DType::Float32,
            ArrayBuffer::Float64(_) => DType::Float64,
        }
    }

    /// Number of stored slots (not elements, when strided)
    pub fn len(&self) -> usize {
        match self {
            ArrayBuffer::Bool(v) => v.len(),
            ArrayBuffer::Int32(v) => v.len(),
            ArrayBuffer::Int64(v) => v.len(),
            ArrayBuffer::Float32(v) => v.len(),
            ArrayBuffer::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A buffer of `len` zero values
    pub fn zeros(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::Bool => ArrayBuffer::Bool(vec![false; len]),
            DType::Int32 => ArrayBuffer::Int32(vec![0; len]),
            DType::Int64 => ArrayBuffer::Int64(vec![0; len]),
            DType::Float32 => ArrayBuffer::Float32(vec![0.0; len]),
            DType::Float64 => ArrayBuffer::Float64(vec![0.0; len]),
        }
    }

    pub(crate) fn scalar_at(&self, slot: usize) -> Scalar {
        match self {
            ArrayBuffer::Bool(v) => Scalar::Bool(v[slot]),
            ArrayBuffer::Int32(v) => Scalar::Int(i64::from(v[slot])),
            ArrayBuffer::Int64(v) => Scalar::Int(v[slot]),
            ArrayBuffer::Float32(v) => Scalar::Float(f64::from(v[slot])),
            ArrayBuffer::Float64(v) => Scalar::Float(v[slot]),
        }
    }

    /// Element-wise cast of every `stride`-th slot into a contiguous buffer.
    pub(crate) fn gather_cast(&self, len: usize, stride: usize, dtype: DType) -> Self {
        let scalars = (0..len).map(|i| self.scalar_at(i * stride));
        match dtype {
            DType::Bool => ArrayBuffer::Bool(scalars.map(Scalar::to_bool).collect()),
            DType::Int32 => ArrayBuffer::Int32(scalars.map(|s| s.to_i64() as i32).collect()),
            DType::Int64 => ArrayBuffer::Int64(scalars.map(Scalar::to_i64).collect()),
            DType::Float32 => ArrayBuffer::Float32(scalars.map(|s| s.to_f64() as f32).collect()),
            DType::Float64 => ArrayBuffer::Float64(scalars.map(Scalar::to_f64).collect()),
        }
    }

    /// Pointer to slot 0, aligned for the element type. Dangling when empty.
    pub(crate) fn data_ptr(&mut self) -> NonNull<u8> {
        match self {
            ArrayBuffer::Bool(v) => NonNull::from(v.as_mut_slice()).cast(),
            ArrayBuffer::Int32(v) => NonNull::from(v.as_mut_slice()).cast(),
            ArrayBuffer::Int64(v) => NonNull::from(v.as_mut_slice()).cast(),
            ArrayBuffer::Float32(v) => NonNull::from(v.as_mut_slice()).cast(),
            ArrayBuffer::Float64(v) => NonNull::from(v.as_mut_slice()).cast(),
        }
    }
}

/// One array element, widened for casting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub(crate) fn to_bool(self) -> bool {
        match self {
            Scalar::Bool(b) => b,
            Scalar::Int(n) => n != 0,
            Scalar::Float(f) => f != 0.0,
        }
    }

    pub(crate) fn to_i64(self) -> i64 {
        match self {
            Scalar::Bool(b) => i64::from(b),
            Scalar::Int(n) => n,
            Scalar::Float(f) => f as i64,
        }
    }

    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Int(n) => n as f64,
            Scalar::Float(f) => f,
        }
    }
}

/// Object tree to allocate in a host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    List(Vec<HostValue>),
    /// Array whose element `i` lives in slot `i * stride` of the buffer
    Array { buffer: ArrayBuffer, stride: usize },
    /// Object with named attributes
    Instance {
        type_name: SmolStr,
        attrs: IndexMap<SmolStr, HostValue>,
    },
}

impl HostValue {
    /// An instance of `type_name` without attributes
    pub fn instance(type_name: impl Into<SmolStr>) -> Self {
        HostValue::Instance {
            type_name: type_name.into(),
            attrs: IndexMap::new(),
        }
    }

    /// Add an attribute to an instance. No effect on other variants.
    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<HostValue>) -> Self {
        if let HostValue::Instance { attrs, .. } = &mut self {
            attrs.insert(name.into(), value.into());
        }
        self
    }

    /// Contiguous array
    pub fn array(buffer: ArrayBuffer) -> Self {
        HostValue::Array { buffer, stride: 1 }
    }

    /// Non-contiguous array: every `stride`-th slot of `buffer` is an element
    pub fn strided(buffer: ArrayBuffer, stride: usize) -> Self {
        HostValue::Array {
            buffer,
            stride: stride.max(1),
        }
    }

    pub fn f64_array(values: &[f64]) -> Self {
        Self::array(ArrayBuffer::Float64(values.to_vec()))
    }

    pub fn bool_array(values: &[bool]) -> Self {
        Self::array(ArrayBuffer::Bool(values.to_vec()))
    }

    pub fn i64_array(values: &[i64]) -> Self {
        Self::array(ArrayBuffer::Int64(values.to_vec()))
    }

    pub fn type_name(&self) -> &str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::List(_) => "list",
            HostValue::Array { .. } => "ndarray",
            HostValue::Instance { type_name, .. } => type_name,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => write!(f, "None"),
            HostValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            HostValue::Int(n) => write!(f, "{}", n),
            HostValue::Float(n) => write!(f, "{}", n),
            HostValue::Str(s) => write!(f, "'{}'", s),
            HostValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Array { buffer, stride } => write!(
                f,
                "<ndarray dtype={} len={}>",
                buffer.dtype(),
                buffer.len().div_ceil(*stride)
            ),
            HostValue::Instance { type_name, .. } => write!(f, "<{} object>", type_name),
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(SmolStr::new(value))
    }
}

impl From<ArrayBuffer> for HostValue {
    fn from(buffer: ArrayBuffer) -> Self {
        HostValue::array(buffer)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_builder() {
        let value = HostValue::instance("Traffic")
            .with_attr("ntraf", 3)
            .with_attr("lat", HostValue::f64_array(&[52.0, 52.1, 52.2]));

        match &value {
            HostValue::Instance { type_name, attrs } => {
                assert_eq!(type_name.as_str(), "Traffic");
                assert_eq!(attrs.len(), 2);
                assert_eq!(attrs.get("ntraf"), Some(&HostValue::Int(3)));
            }
            other => panic!("expected instance, got {}", other),
        }
        assert_eq!(value.type_name(), "Traffic");
    }

    #[test]
    fn test_gather_cast() {
        let buffer = ArrayBuffer::Float64(vec![1.5, -1.0, 0.0, 9.0, 2.0, 4.0]);
        assert_eq!(
            buffer.gather_cast(3, 2, DType::Float64),
            ArrayBuffer::Float64(vec![1.5, 0.0, 2.0])
        );
        assert_eq!(
            buffer.gather_cast(3, 2, DType::Bool),
            ArrayBuffer::Bool(vec![true, false, true])
        );
        assert_eq!(
            ArrayBuffer::Int32(vec![1, 2]).gather_cast(2, 1, DType::Float64),
            ArrayBuffer::Float64(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(HostValue::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(
            HostValue::strided(ArrayBuffer::zeros(DType::Float64, 6), 2).to_string(),
            "<ndarray dtype=float64 len=3>"
        );
        assert_eq!(HostValue::instance("Conf").to_string(), "<Conf object>");
    }
}
