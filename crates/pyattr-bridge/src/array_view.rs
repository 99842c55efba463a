//! Typed Array Views
//!
//! A [`TypedArrayView<T>`] exposes a host array as a contiguous buffer of
//! `T` for bulk numeric access. It is built in one of two ways:
//!
//! 1. **Materialization** of an existing object. The host's conversion
//!    primitive either hands back the source itself, when it already has
//!    element type `T` and a contiguous layout ([`Materialization::Aliased`]),
//!    or a freshly allocated copy ([`Materialization::Copied`]).
//! 2. **Allocation** of a brand-new array ([`Materialization::Allocated`]).
//!
//! ## Aliasing
//!
//! Writes through an aliased view land in the source object's storage and
//! are visible to the host immediately. Writes through a copied view stay in
//! the copy; nothing is written back.
//!
//! Any view may share its storage with another one: two views of the same
//! attribute alias each other, and so does a new array attached to a parent
//! and read back by name. Reads are safe. Writes ([`set`](TypedArrayView::set),
//! [`as_mut_slice`](TypedArrayView::as_mut_slice)) are `unsafe`, since the
//! caller has to rule out a live slice of the same storage elsewhere:
//!
//! ```compile_fail
//! use pyattr_bridge::host::memory::MemoryHost;
//! use pyattr_bridge::DoubleArrayView;
//!
//! let host = MemoryHost::new();
//! let mut view = DoubleArrayView::new(&host, 1);
//! view.set(0, 1.0).unwrap();
//! ```
//!
//! ## Failure
//!
//! The flag-style constructors (`from_attr`, `from_ref`, `new`, ...) never
//! fail: a view that could not be materialized reports `is_valid() == false`,
//! a null pointer and a size of zero, and keeps the reason in
//! [`error`](TypedArrayView::error). The `try_*` constructors return the
//! error instead.

use std::fmt;
use std::ptr;
use std::slice;

use crate::dtype::Element;
use crate::error::{BridgeError, BridgeResult};
use crate::external_ref::ExternalRef;
use crate::host::{ArrayRequirements, HostRuntime, ObjHandle};

/// How a view obtained its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    /// Shares storage with the source object
    Aliased,
    /// Owns a converted copy of the source
    Copied,
    /// Owns a new, zero-initialized array
    Allocated,
}

/// The counted reference that keeps the view's buffer alive.
enum Backing<'h, H: HostRuntime> {
    /// A reference to the source object itself
    Aliased(ExternalRef<'h, H>),
    /// The only reference to a copy made by the host
    Copied(ExternalRef<'h, H>),
    Allocated(ExternalRef<'h, H>),
}

impl<'h, H: HostRuntime> Backing<'h, H> {
    fn array(&self) -> &ExternalRef<'h, H> {
        match self {
            Backing::Aliased(array) | Backing::Copied(array) | Backing::Allocated(array) => array,
        }
    }

    fn into_array(self) -> ExternalRef<'h, H> {
        match self {
            Backing::Aliased(array) | Backing::Copied(array) | Backing::Allocated(array) => array,
        }
    }

    fn materialization(&self) -> Materialization {
        match self {
            Backing::Aliased(_) => Materialization::Aliased,
            Backing::Copied(_) => Materialization::Copied,
            Backing::Allocated(_) => Materialization::Allocated,
        }
    }
}

/// Contiguous, typed view of a host array.
///
/// `ptr` is an iteration cursor that starts at `ptr_start`; see
/// [`advance`](Self::advance) and [`reset`](Self::reset).
pub struct TypedArrayView<'h, T: Element, H: HostRuntime> {
    host: &'h H,
    backing: Option<Backing<'h, H>>,
    error: Option<BridgeError>,
    ptr: *mut T,
    ptr_start: *mut T,
    len: usize,
}

/// View over `float64` arrays
pub type DoubleArrayView<'h, H> = TypedArrayView<'h, f64, H>;

/// View over `bool` arrays
pub type BoolArrayView<'h, H> = TypedArrayView<'h, bool, H>;

/// View over `int64` arrays
pub type IntArrayView<'h, H> = TypedArrayView<'h, i64, H>;

impl<'h, T: Element, H: HostRuntime> TypedArrayView<'h, T, H> {
    /// Materialize attribute `name` of a raw parent handle.
    pub fn from_attr(host: &'h H, parent: ObjHandle, name: &str) -> Self {
        Self::settle(host, Self::try_from_attr(host, parent, name))
    }

    pub fn try_from_attr(host: &'h H, parent: ObjHandle, name: &str) -> BridgeResult<Self> {
        Self::materialize(ExternalRef::try_lookup(host, parent, name)?)
    }

    /// Materialize attribute `name` of a wrapped parent.
    pub fn from_attr_of(parent: &ExternalRef<'h, H>, name: &str) -> Self {
        Self::settle(parent.host(), Self::try_from_attr_of(parent, name))
    }

    pub fn try_from_attr_of(parent: &ExternalRef<'h, H>, name: &str) -> BridgeResult<Self> {
        Self::materialize(parent.try_attr(name)?)
    }

    /// Materialize an object the caller already holds a reference to.
    ///
    /// Takes over `source`; its count is released once materialization is
    /// done (the view keeps its own reference).
    pub fn from_ref(source: ExternalRef<'h, H>) -> Self {
        let host = source.host();
        Self::settle(host, Self::materialize(source))
    }

    pub fn try_from_ref(source: ExternalRef<'h, H>) -> BridgeResult<Self> {
        Self::materialize(source)
    }

    /// Allocate a new one-dimensional array of `len` elements.
    pub fn new(host: &'h H, len: usize) -> Self {
        Self::settle(host, Self::try_new(host, len))
    }

    pub fn try_new(host: &'h H, len: usize) -> BridgeResult<Self> {
        let array = ExternalRef::from_owned(host, Some(host.array_new(T::DTYPE, len)?));
        Self::from_backing(host, Backing::Allocated(array))
    }

    fn materialize(source: ExternalRef<'h, H>) -> BridgeResult<Self> {
        let host = source.host();
        let handle = source.require("array materialization")?;
        if !host.is_array(handle) {
            return Err(BridgeError::conversion_failed(
                host.type_name(handle),
                T::DTYPE.name(),
                "object is not an array",
            ));
        }

        let converted = host.array_from_otf(handle, T::DTYPE, ArrayRequirements::IN_ARRAY)?;
        let array = ExternalRef::from_owned(host, Some(converted));
        let backing = if converted == handle {
            Backing::Aliased(array)
        } else {
            Backing::Copied(array)
        };
        Self::from_backing(host, backing)
    }

    fn from_backing(host: &'h H, backing: Backing<'h, H>) -> BridgeResult<Self> {
        let handle = backing.array().require("array view")?;
        let info = host.array_info(handle)?;
        if info.dtype != T::DTYPE || !info.is_c_contiguous() {
            return Err(BridgeError::conversion_failed(
                info.dtype.name(),
                T::DTYPE.name(),
                "host returned a non-conforming array",
            ));
        }

        let ptr = info.data.cast::<T>().as_ptr();
        tracing::debug!(
            array = %handle,
            dtype = %T::DTYPE,
            len = info.len,
            materialization = ?backing.materialization(),
            "array view ready"
        );
        Ok(Self {
            host,
            backing: Some(backing),
            error: None,
            ptr,
            ptr_start: ptr,
            len: info.len,
        })
    }

    fn settle(host: &'h H, result: BridgeResult<Self>) -> Self {
        result.unwrap_or_else(|error| {
            tracing::debug!(dtype = %T::DTYPE, %error, "array view invalid");
            Self {
                host,
                backing: None,
                error: Some(error),
                ptr: ptr::null_mut(),
                ptr_start: ptr::null_mut(),
                len: 0,
            }
        })
    }

    pub fn is_valid(&self) -> bool {
        self.backing.is_some()
    }

    /// Why the view is invalid, if it is.
    pub fn error(&self) -> Option<&BridgeError> {
        self.error.as_ref()
    }

    /// Element count of the backing buffer; zero when invalid.
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn host(&self) -> &'h H {
        self.host
    }

    /// How the buffer was obtained; `None` when invalid.
    pub fn materialization(&self) -> Option<Materialization> {
        self.backing.as_ref().map(Backing::materialization)
    }

    /// The array object backing this view.
    pub fn array(&self) -> Option<&ExternalRef<'h, H>> {
        self.backing.as_ref().map(Backing::array)
    }

    /// Give up the view and keep only the reference to its array object.
    pub fn into_array(self) -> Option<ExternalRef<'h, H>> {
        self.backing.map(Backing::into_array)
    }

    /// Cursor position; null when invalid.
    pub fn ptr(&self) -> *mut T {
        self.ptr
    }

    /// First element; null when invalid.
    pub fn ptr_start(&self) -> *mut T {
        self.ptr_start
    }

    /// Cursor position as an element index.
    pub fn offset(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        // SAFETY: both pointers lie in the same live buffer, `ptr >= ptr_start`.
        unsafe { self.ptr.offset_from(self.ptr_start) as usize }
    }

    /// Move the cursor forward by `n` elements, stopping at the end.
    pub fn advance(&mut self, n: usize) {
        if self.len == 0 {
            return;
        }
        let step = n.min(self.len - self.offset());
        // SAFETY: the result is at most one past the last element.
        self.ptr = unsafe { self.ptr.add(step) };
    }

    /// Move the cursor back to the first element.
    pub fn reset(&mut self) {
        self.ptr = self.ptr_start;
    }

    /// Element under the cursor, `None` at the end.
    pub fn current(&self) -> Option<T> {
        self.get(self.offset())
    }

    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: valid views address `len` initialized elements.
        Some(unsafe { self.ptr_start.add(index).read() })
    }

    /// Write `value` at `index`.
    ///
    /// # Safety
    ///
    /// No slice of the same storage, from this view or from another view
    /// aliasing it, may be alive during the write.
    pub unsafe fn set(&mut self, index: usize, value: T) -> BridgeResult<()> {
        if index >= self.len {
            return Err(BridgeError::index_out_of_range(index, self.len));
        }
        self.ptr_start.add(index).write(value);
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: `len` contiguous elements of `T`, kept alive by `backing`.
        unsafe { slice::from_raw_parts(self.ptr_start, self.len) }
    }

    /// Mutable access to the whole buffer.
    ///
    /// # Safety
    ///
    /// No other view aliasing the same storage may be read or written while
    /// the returned slice is alive.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        slice::from_raw_parts_mut(self.ptr_start, self.len)
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T: Element, H: HostRuntime> fmt::Debug for TypedArrayView<'_, T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedArrayView")
            .field("dtype", &T::DTYPE)
            .field("materialization", &self.materialization())
            .field("len", &self.len)
            .field("error", &self.error)
            .finish()
    }
}
