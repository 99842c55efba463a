//! # PyAttr Bridge
//!
//! Reference-counted access from statically typed numeric code into the
//! objects of a dynamic host runtime.
//!
//! The host owns every object and manages its lifetime by reference
//! counting. This crate lets a caller read and write what hangs off those
//! objects, without ever leaking or over-releasing a count:
//!
//! - [`ExternalRef`]: owned reference that releases its count exactly once
//! - [`TypedArrayView`]: typed, contiguous view of a host array, aliasing
//!   the host's storage when it can and copying when it must
//! - [`DynamicList`]: host list with balanced set/append semantics
//! - [`get_attr_f64`] and friends: single numeric attributes
//!
//! ## Example
//!
//! ```
//! use pyattr_bridge::host::memory::MemoryHost;
//! use pyattr_bridge::host::value::HostValue;
//! use pyattr_bridge::{DoubleArrayView, ExternalRef, Materialization};
//!
//! let host = MemoryHost::new();
//! let traf = host.alloc(
//!     HostValue::instance("Traffic").with_attr("gs", HostValue::f64_array(&[120.0, 240.0])),
//! );
//!
//! let mut gs = DoubleArrayView::from_attr(&host, traf, "gs");
//! assert!(gs.is_valid());
//! assert_eq!(gs.materialization(), Some(Materialization::Aliased));
//! // SAFETY: no slice of this storage is alive.
//! unsafe { gs.set(0, 125.0) }.unwrap();
//!
//! let traf = ExternalRef::from_owned(&host, Some(traf));
//! let again = DoubleArrayView::from_attr_of(&traf, "gs");
//! assert_eq!(again.to_vec(), vec![125.0, 240.0]);
//! ```
//!
//! ## Critical Section
//!
//! The host is not thread-safe. Callers serialize all access with the host's
//! global lock, modelled by [`GilGuard`]; nothing in this crate locks.
//!
//! ## Module Structure
//!
//! - [`host`]: the [`HostRuntime`] boundary and the in-process [`MemoryHost`]
//! - [`external_ref`]: owned and borrowed references
//! - [`array_view`]: typed array views
//! - [`dynamic_list`]: host lists
//! - [`scalar`]: scalar attribute accessors
//! - [`conversion`]: Rust values into host objects
//! - [`dtype`]: element types
//! - [`gil`]: critical-section contract
//! - [`config`]: host configuration
//! - [`error`]: error types
//!
//! [`MemoryHost`]: host::memory::MemoryHost

pub mod array_view;
pub mod config;
pub mod conversion;
pub mod dtype;
pub mod dynamic_list;
pub mod error;
pub mod external_ref;
pub mod gil;
pub mod host;
pub mod scalar;

// Re-export main types for convenience
pub use array_view::{BoolArrayView, DoubleArrayView, IntArrayView, Materialization, TypedArrayView};
pub use config::{HostConfig, Placeholder};
pub use conversion::IntoHostObject;
pub use dtype::{DType, Element};
pub use dynamic_list::DynamicList;
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use external_ref::{BorrowedRef, ExternalRef};
pub use gil::{GilGuard, GilState};
pub use host::{HostRuntime, ObjHandle};
pub use scalar::{get_attr_f64, get_attr_i64, set_attr_f64, set_attr_i64};
