//! Element Types
//!
//! [`DType`] names the element types a host array can carry. [`Element`] is
//! the closed set of Rust types a [`TypedArrayView`](crate::TypedArrayView)
//! can be parameterized over: one floating-point, one boolean and one integer
//! kind.

use std::fmt;
use std::str::FromStr;

/// Host array element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean (one byte)
    Bool,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl DType {
    /// Get the size in bytes for this dtype
    pub fn size(&self) -> usize {
        match self {
            DType::Bool => 1,
            DType::Int32 | DType::Float32 => 4,
            DType::Int64 | DType::Float64 => 8,
        }
    }

    /// Get the dtype string (e.g., "float64")
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::Int32 | DType::Int64)
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    /// Whether every value of `self` is representable in `to`.
    ///
    /// Booleans widen to anything; integers widen to wider integers and to
    /// `float64`; `float32` widens to `float64`.
    pub fn can_cast_safely(&self, to: DType) -> bool {
        if *self == to {
            return true;
        }
        match (self, to) {
            (DType::Bool, _) => true,
            (DType::Int32, DType::Int64 | DType::Float64) => true,
            (DType::Int64, DType::Float64) => true,
            (DType::Float32, DType::Float64) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" | "bool_" | "?" => Ok(DType::Bool),
            "int32" | "i4" | "i" => Ok(DType::Int32),
            "int64" | "i8" | "l" | "int" => Ok(DType::Int64),
            "float32" | "f4" | "f" => Ok(DType::Float32),
            "float64" | "f8" | "d" | "float" => Ok(DType::Float64),
            other => Err(format!("unknown dtype '{}'", other)),
        }
    }
}

mod private {
    pub trait Sealed {}

    impl Sealed for f64 {}
    impl Sealed for bool {}
    impl Sealed for i64 {}
}

/// Rust element type of a typed view.
///
/// Sealed: the view hands out raw pointers into host buffers, so only types
/// whose layout matches a host dtype exactly may implement it.
pub trait Element: private::Sealed + Copy + PartialEq + fmt::Debug + 'static {
    /// Host dtype with the same in-memory representation
    const DTYPE: DType;
}

impl Element for f64 {
    const DTYPE: DType = DType::Float64;
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;
}

impl Element for i64 {
    const DTYPE: DType = DType::Int64;
}
