//! Host Runtime Boundary
//!
//! The dynamic runtime that owns the objects is an external collaborator.
//! [`HostRuntime`] is the complete set of primitives the bridge consumes:
//! reference counting, attribute lookup, array conversion and allocation,
//! sequence access and numeric coercion. Everything above this trait is
//! expressed in terms of counted references; nothing below it is modeled by
//! the bridge.
//!
//! [`memory::MemoryHost`] is an in-process implementation with explicit
//! reference counts, used by the tests and benchmarks.
//!
//! ## Reference conventions
//!
//! - "new reference": the caller receives one count and must release it
//! - "borrowed": no count transferred; valid while some owner keeps it alive
//! - "steals": the callee takes over the caller's count, even on failure

pub mod memory;
pub mod value;

use std::fmt;
use std::num::NonZeroU64;
use std::ptr::NonNull;

use smol_str::SmolStr;

use crate::dtype::DType;
use crate::error::BridgeResult;

/// Handle to one host object.
///
/// Plain data: copying a handle does not touch the reference count. Nullable
/// handles are spelled `Option<ObjHandle>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjHandle(NonZeroU64);

impl ObjHandle {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ObjHandle)
    }

    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ObjHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layout requirements passed to [`HostRuntime::array_from_otf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayRequirements {
    /// Elements must be adjacent in memory, first to last
    pub c_contiguous: bool,
    /// Allow lossy element casts
    pub force_cast: bool,
}

impl ArrayRequirements {
    /// Read-only input array: contiguous, safe casts only.
    pub const IN_ARRAY: Self = Self {
        c_contiguous: true,
        force_cast: false,
    };

    pub fn with_force_cast(mut self) -> Self {
        self.force_cast = true;
        self
    }
}

/// Storage description of a host array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayInfo {
    /// Address of element 0
    pub data: NonNull<u8>,
    /// Number of elements
    pub len: usize,
    pub dtype: DType,
    /// Distance between consecutive elements, in elements
    pub stride: usize,
}

impl ArrayInfo {
    pub fn is_c_contiguous(&self) -> bool {
        self.stride == 1 || self.len <= 1
    }

    /// Whether this array can be used as-is under `requirements`
    pub fn satisfies(&self, dtype: DType, requirements: ArrayRequirements) -> bool {
        self.dtype == dtype && (!requirements.c_contiguous || self.is_c_contiguous())
    }
}

/// Primitives of the host runtime.
///
/// All methods assume the caller holds the host's global lock (see
/// [`crate::gil`]). Implementations are single-threaded and take `&self`;
/// interior mutability is theirs to manage.
pub trait HostRuntime {
    /// Add one count to `obj`.
    fn incref(&self, obj: ObjHandle);

    /// Remove one count from `obj`, freeing it when none remain.
    fn decref(&self, obj: ObjHandle);

    /// Type name used in diagnostics.
    fn type_name(&self, obj: ObjHandle) -> SmolStr;

    /// Look up `name` on `obj`. Returns a new reference.
    fn get_attr(&self, obj: ObjHandle, name: &str) -> BridgeResult<ObjHandle>;

    /// Bind `name` on `obj` to `value`. Does not steal `value`.
    fn set_attr(&self, obj: ObjHandle, name: &str, value: ObjHandle) -> BridgeResult<()>;

    fn is_array(&self, obj: ObjHandle) -> bool;

    /// Convert `obj` to an array of `dtype` meeting `requirements`.
    ///
    /// Returns a new reference: `obj` itself when it already complies,
    /// otherwise a freshly allocated copy.
    fn array_from_otf(
        &self,
        obj: ObjHandle,
        dtype: DType,
        requirements: ArrayRequirements,
    ) -> BridgeResult<ObjHandle>;

    /// Allocate a one-dimensional, contiguous array of `len` elements.
    /// Returns a new reference.
    fn array_new(&self, dtype: DType, len: usize) -> BridgeResult<ObjHandle>;

    fn array_info(&self, obj: ObjHandle) -> BridgeResult<ArrayInfo>;

    /// Create a sequence of `size` placeholder elements. Returns a new reference.
    fn list_new(&self, size: usize) -> BridgeResult<ObjHandle>;

    fn list_len(&self, list: ObjHandle) -> BridgeResult<usize>;

    /// Element at `index`. Returns a borrowed reference.
    fn list_get(&self, list: ObjHandle, index: usize) -> BridgeResult<ObjHandle>;

    /// Replace the element at `index`, releasing the previous one.
    /// Steals `item`, also when it fails.
    fn list_set(&self, list: ObjHandle, index: usize, item: ObjHandle) -> BridgeResult<()>;

    /// Push `item` at the end. Does not steal `item`.
    fn list_append(&self, list: ObjHandle, item: ObjHandle) -> BridgeResult<()>;

    fn float_new(&self, value: f64) -> BridgeResult<ObjHandle>;

    fn int_new(&self, value: i64) -> BridgeResult<ObjHandle>;

    fn bool_new(&self, value: bool) -> BridgeResult<ObjHandle>;

    /// Numeric coercion to a float.
    fn as_f64(&self, obj: ObjHandle) -> BridgeResult<f64>;

    /// Numeric coercion to an integer.
    fn as_i64(&self, obj: ObjHandle) -> BridgeResult<i64>;
}
