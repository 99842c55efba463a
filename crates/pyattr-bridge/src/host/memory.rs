//! In-Process Host Runtime
//!
//! [`MemoryHost`] keeps a reference-counted object graph in a single arena.
//! Every object carries an explicit count; when the count reaches zero the
//! object is freed and the references it held (sequence items, attribute
//! values) are released in turn. Ids are never reused, so touching a freed
//! object is reported instead of silently hitting a different one.
//!
//! Array buffers are plain typed vectors that never resize after creation,
//! which keeps the data pointers handed out by [`HostRuntime::array_info`]
//! stable for as long as the array object is alive.

use std::cell::{Cell, RefCell};
use std::mem;
use std::num::NonZeroU64;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::config::{HostConfig, Placeholder};
use crate::dtype::DType;
use crate::error::{BridgeError, BridgeResult};
use crate::gil;
use crate::host::value::{ArrayBuffer, HostValue};
use crate::host::{ArrayInfo, ArrayRequirements, HostRuntime, ObjHandle};

// ============================================================================
// Object Arena
// ============================================================================

/// Reference-count activity since the host was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub increfs: u64,
    pub decrefs: u64,
    pub allocations: u64,
    pub frees: u64,
    /// `incref` on a handle that is not alive
    pub invalid_increfs: u64,
    /// `decref` on a handle that is not alive
    pub invalid_decrefs: u64,
}

#[derive(Debug)]
struct ArrayObject {
    buffer: ArrayBuffer,
    len: usize,
    stride: usize,
}

#[derive(Debug)]
enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    List(Vec<ObjHandle>),
    Array(ArrayObject),
    Instance {
        type_name: SmolStr,
        attrs: IndexMap<SmolStr, ObjHandle>,
    },
}

impl Object {
    fn type_name(&self) -> SmolStr {
        match self {
            Object::None => SmolStr::new_inline("NoneType"),
            Object::Bool(_) => SmolStr::new_inline("bool"),
            Object::Int(_) => SmolStr::new_inline("int"),
            Object::Float(_) => SmolStr::new_inline("float"),
            Object::Str(_) => SmolStr::new_inline("str"),
            Object::List(_) => SmolStr::new_inline("list"),
            Object::Array(_) => SmolStr::new_inline("ndarray"),
            Object::Instance { type_name, .. } => type_name.clone(),
        }
    }

    /// References this object holds on others
    fn into_children(self) -> Vec<ObjHandle> {
        match self {
            Object::List(items) => items,
            Object::Instance { attrs, .. } => attrs.into_values().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    refcnt: usize,
    object: Object,
}

// ============================================================================
// MemoryHost
// ============================================================================

/// Reference host runtime living entirely in this process.
#[derive(Debug)]
pub struct MemoryHost {
    config: HostConfig,
    objects: RefCell<FxHashMap<ObjHandle, Slot>>,
    next_id: Cell<NonZeroU64>,
    stats: Cell<HostStats>,
    none: ObjHandle,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        let none = ObjHandle(NonZeroU64::MIN);
        let mut objects = FxHashMap::default();
        objects.insert(
            none,
            Slot {
                refcnt: 1,
                object: Object::None,
            },
        );

        Self {
            config,
            objects: RefCell::new(objects),
            next_id: Cell::new(none.0.saturating_add(1)),
            stats: Cell::new(HostStats::default()),
            none,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The shared `None` object. Borrowed: the host keeps one count on it.
    pub fn none(&self) -> ObjHandle {
        self.none
    }

    /// Allocate an object tree. Returns a new reference to its root.
    ///
    /// Setup API for the host side; not subject to the configured limits.
    pub fn alloc(&self, value: impl Into<HostValue>) -> ObjHandle {
        let object = match value.into() {
            HostValue::None => {
                self.incref(self.none);
                return self.none;
            }
            HostValue::Bool(b) => Object::Bool(b),
            HostValue::Int(n) => Object::Int(n),
            HostValue::Float(f) => Object::Float(f),
            HostValue::Str(s) => Object::Str(s),
            HostValue::List(items) => {
                Object::List(items.into_iter().map(|item| self.alloc(item)).collect())
            }
            HostValue::Array { buffer, stride } => {
                let stride = stride.max(1);
                Object::Array(ArrayObject {
                    len: buffer.len().div_ceil(stride),
                    buffer,
                    stride,
                })
            }
            HostValue::Instance { type_name, attrs } => Object::Instance {
                type_name,
                attrs: attrs
                    .into_iter()
                    .map(|(name, value)| (name, self.alloc(value)))
                    .collect(),
            },
        };
        self.insert(object)
    }

    /// Current count of `obj`, `None` once it has been freed.
    pub fn refcount(&self, obj: ObjHandle) -> Option<usize> {
        self.objects.borrow().get(&obj).map(|slot| slot.refcnt)
    }

    pub fn is_alive(&self, obj: ObjHandle) -> bool {
        self.objects.borrow().contains_key(&obj)
    }

    /// Number of objects alive, the `None` singleton included.
    pub fn live_objects(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn stats(&self) -> HostStats {
        self.stats.get()
    }

    /// Deep copy of the object tree rooted at `obj`.
    pub fn snapshot(&self, obj: ObjHandle) -> BridgeResult<HostValue> {
        let objects = self.objects.borrow();
        snapshot_in(&objects, obj)
    }

    /// Elements of an array, widened to `f64`, honoring its stride.
    pub fn array_to_f64_vec(&self, obj: ObjHandle) -> BridgeResult<Vec<f64>> {
        self.with_object(obj, |object| match object {
            Object::Array(arr) => Ok((0..arr.len)
                .map(|i| arr.buffer.scalar_at(i * arr.stride).to_f64())
                .collect()),
            other => Err(BridgeError::type_mismatch("ndarray", other.type_name())),
        })?
    }

    fn insert(&self, object: Object) -> ObjHandle {
        let handle = ObjHandle(self.next_id.get());
        // One id per allocation for the host's lifetime; 2^64 cannot be reached.
        self.next_id
            .set(handle.0.checked_add(1).expect("object id space exhausted"));

        self.objects
            .borrow_mut()
            .insert(handle, Slot { refcnt: 1, object });
        self.bump(|s| s.allocations += 1);
        tracing::trace!(%handle, "host object allocated");
        handle
    }

    fn bump(&self, f: impl FnOnce(&mut HostStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn enter(&self, context: &str) -> BridgeResult<()> {
        if self.config.require_gil {
            gil::ensure_held(context)?;
        }
        Ok(())
    }

    fn with_object<R>(&self, obj: ObjHandle, f: impl FnOnce(&Object) -> R) -> BridgeResult<R> {
        let objects = self.objects.borrow();
        let slot = objects
            .get(&obj)
            .ok_or(BridgeError::DeadObject { handle: obj })?;
        Ok(f(&slot.object))
    }

    fn with_object_mut<R>(
        &self,
        obj: ObjHandle,
        f: impl FnOnce(&mut Object) -> R,
    ) -> BridgeResult<R> {
        let mut objects = self.objects.borrow_mut();
        let slot = objects
            .get_mut(&obj)
            .ok_or(BridgeError::DeadObject { handle: obj })?;
        Ok(f(&mut slot.object))
    }

    fn check_array_len(&self, len: usize) -> BridgeResult<()> {
        match self.config.max_array_len {
            Some(limit) if len > limit => Err(BridgeError::allocation_failed("array", len, limit)),
            _ => Ok(()),
        }
    }

    fn check_list_len(&self, len: usize) -> BridgeResult<()> {
        match self.config.max_list_len {
            Some(limit) if len > limit => Err(BridgeError::allocation_failed("list", len, limit)),
            _ => Ok(()),
        }
    }

    fn list_set_inner(&self, list: ObjHandle, index: usize, item: ObjHandle) -> BridgeResult<()> {
        self.enter("list_set")?;
        if !self.is_alive(item) {
            return Err(BridgeError::DeadObject { handle: item });
        }
        let previous = self.with_object_mut(list, |object| match object {
            Object::List(items) => match items.get_mut(index) {
                Some(slot) => Ok(mem::replace(slot, item)),
                None => Err(BridgeError::index_out_of_range(index, items.len())),
            },
            other => Err(BridgeError::type_mismatch("list", other.type_name())),
        })??;
        self.decref(previous);
        Ok(())
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_in(objects: &FxHashMap<ObjHandle, Slot>, obj: ObjHandle) -> BridgeResult<HostValue> {
    let slot = objects
        .get(&obj)
        .ok_or(BridgeError::DeadObject { handle: obj })?;
    Ok(match &slot.object {
        Object::None => HostValue::None,
        Object::Bool(b) => HostValue::Bool(*b),
        Object::Int(n) => HostValue::Int(*n),
        Object::Float(f) => HostValue::Float(*f),
        Object::Str(s) => HostValue::Str(s.clone()),
        Object::List(items) => HostValue::List(
            items
                .iter()
                .map(|item| snapshot_in(objects, *item))
                .collect::<BridgeResult<_>>()?,
        ),
        Object::Array(arr) => HostValue::Array {
            buffer: arr.buffer.clone(),
            stride: arr.stride,
        },
        Object::Instance { type_name, attrs } => HostValue::Instance {
            type_name: type_name.clone(),
            attrs: attrs
                .iter()
                .map(|(name, value)| Ok((name.clone(), snapshot_in(objects, *value)?)))
                .collect::<BridgeResult<_>>()?,
        },
    })
}

// ============================================================================
// HostRuntime Primitives
// ============================================================================

impl HostRuntime for MemoryHost {
    fn incref(&self, obj: ObjHandle) {
        let alive = match self.objects.borrow_mut().get_mut(&obj) {
            Some(slot) => {
                slot.refcnt += 1;
                true
            }
            None => false,
        };
        if alive {
            self.bump(|s| s.increfs += 1);
        } else {
            self.bump(|s| s.invalid_increfs += 1);
            tracing::error!(handle = %obj, "incref of an object that is not alive");
        }
    }

    fn decref(&self, obj: ObjHandle) {
        let mut pending = vec![obj];
        while let Some(handle) = pending.pop() {
            let freed = {
                let mut objects = self.objects.borrow_mut();
                match objects.get_mut(&handle) {
                    Some(slot) => {
                        slot.refcnt -= 1;
                        if slot.refcnt == 0 {
                            objects.remove(&handle)
                        } else {
                            None
                        }
                    }
                    None => {
                        self.bump(|s| s.invalid_decrefs += 1);
                        tracing::error!(%handle, "decref of an object that is not alive");
                        continue;
                    }
                }
            };
            self.bump(|s| s.decrefs += 1);

            if let Some(slot) = freed {
                self.bump(|s| s.frees += 1);
                tracing::trace!(%handle, "host object freed");
                pending.extend(slot.object.into_children());
            }
        }
    }

    fn type_name(&self, obj: ObjHandle) -> SmolStr {
        self.with_object(obj, Object::type_name)
            .unwrap_or_else(|_| SmolStr::new_inline("<freed>"))
    }

    fn get_attr(&self, obj: ObjHandle, name: &str) -> BridgeResult<ObjHandle> {
        self.enter("get_attr")?;
        let value = self.with_object(obj, |object| match object {
            Object::Instance { attrs, .. } => attrs.get(name).copied(),
            _ => None,
        })?;
        match value {
            Some(value) => {
                self.incref(value);
                Ok(value)
            }
            None => Err(BridgeError::attribute_not_found(name, self.type_name(obj))),
        }
    }

    fn set_attr(&self, obj: ObjHandle, name: &str, value: ObjHandle) -> BridgeResult<()> {
        self.enter("set_attr")?;
        if !self.is_alive(value) {
            return Err(BridgeError::DeadObject { handle: value });
        }
        let previous = self.with_object_mut(obj, |object| match object {
            Object::Instance { attrs, .. } => Ok(attrs.insert(SmolStr::new(name), value)),
            other => Err(BridgeError::type_mismatch("instance", other.type_name())),
        })??;
        self.incref(value);
        if let Some(previous) = previous {
            self.decref(previous);
        }
        Ok(())
    }

    fn is_array(&self, obj: ObjHandle) -> bool {
        matches!(self.with_object(obj, |o| matches!(o, Object::Array(_))), Ok(true))
    }

    fn array_from_otf(
        &self,
        obj: ObjHandle,
        dtype: DType,
        requirements: ArrayRequirements,
    ) -> BridgeResult<ObjHandle> {
        self.enter("array_from_otf")?;
        let copy = self.with_object(obj, |object| {
            let arr = match object {
                Object::Array(arr) => arr,
                other => {
                    return Err(BridgeError::conversion_failed(
                        other.type_name(),
                        dtype.name(),
                        "object is not an array",
                    ))
                }
            };

            let source = arr.buffer.dtype();
            let contiguous = arr.stride == 1 || arr.len <= 1;
            if source == dtype && (contiguous || !requirements.c_contiguous) {
                return Ok(None);
            }
            if !requirements.force_cast && !source.can_cast_safely(dtype) {
                return Err(BridgeError::conversion_failed(
                    source.name(),
                    dtype.name(),
                    "not a safe cast",
                ));
            }
            self.check_array_len(arr.len)?;
            Ok(Some((arr.buffer.gather_cast(arr.len, arr.stride, dtype), arr.len)))
        })??;

        match copy {
            None => {
                self.incref(obj);
                Ok(obj)
            }
            Some((buffer, len)) => {
                let handle = self.insert(Object::Array(ArrayObject {
                    buffer,
                    len,
                    stride: 1,
                }));
                tracing::debug!(source = %obj, copy = %handle, %dtype, len, "array converted by copy");
                Ok(handle)
            }
        }
    }

    fn array_new(&self, dtype: DType, len: usize) -> BridgeResult<ObjHandle> {
        self.enter("array_new")?;
        self.check_array_len(len)?;
        Ok(self.insert(Object::Array(ArrayObject {
            buffer: ArrayBuffer::zeros(dtype, len),
            len,
            stride: 1,
        })))
    }

    fn array_info(&self, obj: ObjHandle) -> BridgeResult<ArrayInfo> {
        self.enter("array_info")?;
        self.with_object_mut(obj, |object| match object {
            Object::Array(arr) => Ok(ArrayInfo {
                data: arr.buffer.data_ptr(),
                len: arr.len,
                dtype: arr.buffer.dtype(),
                stride: arr.stride,
            }),
            other => Err(BridgeError::type_mismatch("ndarray", other.type_name())),
        })?
    }

    fn list_new(&self, size: usize) -> BridgeResult<ObjHandle> {
        self.enter("list_new")?;
        self.check_list_len(size)?;
        let items = (0..size)
            .map(|_| match self.config.list_placeholder {
                Placeholder::None => {
                    self.incref(self.none);
                    self.none
                }
                Placeholder::Zero => self.insert(Object::Int(0)),
            })
            .collect();
        Ok(self.insert(Object::List(items)))
    }

    fn list_len(&self, list: ObjHandle) -> BridgeResult<usize> {
        self.enter("list_len")?;
        self.with_object(list, |object| match object {
            Object::List(items) => Ok(items.len()),
            other => Err(BridgeError::type_mismatch("list", other.type_name())),
        })?
    }

    fn list_get(&self, list: ObjHandle, index: usize) -> BridgeResult<ObjHandle> {
        self.enter("list_get")?;
        self.with_object(list, |object| match object {
            Object::List(items) => items
                .get(index)
                .copied()
                .ok_or_else(|| BridgeError::index_out_of_range(index, items.len())),
            other => Err(BridgeError::type_mismatch("list", other.type_name())),
        })?
    }

    fn list_set(&self, list: ObjHandle, index: usize, item: ObjHandle) -> BridgeResult<()> {
        let result = self.list_set_inner(list, index, item);
        if result.is_err() && self.is_alive(item) {
            self.decref(item);
        }
        result
    }

    fn list_append(&self, list: ObjHandle, item: ObjHandle) -> BridgeResult<()> {
        self.enter("list_append")?;
        if !self.is_alive(item) {
            return Err(BridgeError::DeadObject { handle: item });
        }
        let limit = self.config.max_list_len;
        self.with_object_mut(list, |object| match object {
            Object::List(items) => match limit {
                Some(limit) if items.len() >= limit => Err(BridgeError::allocation_failed(
                    "list",
                    items.len() + 1,
                    limit,
                )),
                _ => {
                    items.push(item);
                    Ok(())
                }
            },
            other => Err(BridgeError::type_mismatch("list", other.type_name())),
        })??;
        self.incref(item);
        Ok(())
    }

    fn float_new(&self, value: f64) -> BridgeResult<ObjHandle> {
        self.enter("float_new")?;
        Ok(self.insert(Object::Float(value)))
    }

    fn int_new(&self, value: i64) -> BridgeResult<ObjHandle> {
        self.enter("int_new")?;
        Ok(self.insert(Object::Int(value)))
    }

    fn bool_new(&self, value: bool) -> BridgeResult<ObjHandle> {
        self.enter("bool_new")?;
        Ok(self.insert(Object::Bool(value)))
    }

    fn as_f64(&self, obj: ObjHandle) -> BridgeResult<f64> {
        self.enter("as_f64")?;
        self.with_object(obj, |object| match object {
            Object::Float(f) => Ok(*f),
            Object::Int(n) => Ok(*n as f64),
            Object::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(BridgeError::coercion_failed(other.type_name(), "float")),
        })?
    }

    fn as_i64(&self, obj: ObjHandle) -> BridgeResult<i64> {
        self.enter("as_i64")?;
        self.with_object(obj, |object| match object {
            Object::Int(n) => Ok(*n),
            Object::Bool(b) => Ok(i64::from(*b)),
            other => Err(BridgeError::coercion_failed(other.type_name(), "int")),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gil::GilGuard;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alloc_and_free_tree() {
        let host = MemoryHost::new();
        let root = host.alloc(
            HostValue::instance("Traffic")
                .with_attr("lat", HostValue::f64_array(&[1.0, 2.0]))
                .with_attr("ids", HostValue::from(vec![1, 2, 3])),
        );

        // None + root + array + list + 3 ints
        assert_eq!(host.live_objects(), 7);
        assert_eq!(host.refcount(root), Some(1));

        host.decref(root);
        assert_eq!(host.live_objects(), 1);
        assert!(!host.is_alive(root));
        assert_eq!(host.stats().invalid_decrefs, 0);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let host = MemoryHost::new();
        assert_eq!(host.none().raw(), 1);

        let first = host.alloc(1.0);
        assert_eq!(first.raw(), 2);
        host.decref(first);
        let second = host.alloc(1.0);
        assert_eq!(second.raw(), 3);
        assert!(!host.is_alive(first));
    }

    #[test]
    fn test_release_of_freed_object_is_reported() {
        let host = MemoryHost::new();
        let obj = host.alloc(1.5);
        host.decref(obj);
        host.decref(obj);
        host.incref(obj);

        let stats = host.stats();
        assert_eq!(stats.invalid_decrefs, 1);
        assert_eq!(stats.invalid_increfs, 1);
        assert_eq!(stats.frees, 1);
    }

    #[test]
    fn test_get_attr_returns_new_reference() {
        let host = MemoryHost::new();
        let root = host.alloc(HostValue::instance("Conf").with_attr("rpz", 9260.0));

        let rpz = host.get_attr(root, "rpz").unwrap();
        assert_eq!(host.refcount(rpz), Some(2));
        assert_eq!(host.as_f64(rpz).unwrap(), 9260.0);
        host.decref(rpz);
        assert_eq!(host.refcount(rpz), Some(1));

        let err = host.get_attr(root, "hpz").unwrap_err();
        assert_eq!(err, BridgeError::attribute_not_found("hpz", "Conf"));
    }

    #[test]
    fn test_set_attr_replaces_and_releases() {
        let host = MemoryHost::new();
        let root = host.alloc(HostValue::instance("Conf").with_attr("dtlook", 300.0));
        let old = host.get_attr(root, "dtlook").unwrap();
        let new = host.alloc(120.0);

        host.set_attr(root, "dtlook", new).unwrap();
        assert_eq!(host.refcount(new), Some(2));
        assert_eq!(host.refcount(old), Some(1));

        host.decref(old);
        assert!(!host.is_alive(old));
    }

    #[test]
    fn test_array_from_otf_alias() {
        let host = MemoryHost::new();
        let arr = host.alloc(HostValue::f64_array(&[1.0, 2.0, 3.0]));

        let converted = host
            .array_from_otf(arr, DType::Float64, ArrayRequirements::IN_ARRAY)
            .unwrap();
        assert_eq!(converted, arr);
        assert_eq!(host.refcount(arr), Some(2));
    }

    #[test]
    fn test_array_from_otf_copies_strided() {
        let host = MemoryHost::new();
        let arr = host.alloc(HostValue::strided(
            ArrayBuffer::Float64(vec![1.0, 0.0, 2.0, 0.0, 3.0]),
            2,
        ));

        let converted = host
            .array_from_otf(arr, DType::Float64, ArrayRequirements::IN_ARRAY)
            .unwrap();
        assert_ne!(converted, arr);
        assert_eq!(host.refcount(arr), Some(1));
        assert_eq!(host.array_to_f64_vec(converted).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(host.array_info(converted).unwrap().is_c_contiguous());
    }

    #[test]
    fn test_array_from_otf_unsafe_cast() {
        let host = MemoryHost::new();
        let arr = host.alloc(HostValue::f64_array(&[0.0, 1.0]));

        let err = host
            .array_from_otf(arr, DType::Bool, ArrayRequirements::IN_ARRAY)
            .unwrap_err();
        assert!(matches!(err, BridgeError::ConversionFailed { .. }));

        let forced = host
            .array_from_otf(arr, DType::Bool, ArrayRequirements::IN_ARRAY.with_force_cast())
            .unwrap();
        assert_eq!(
            host.snapshot(forced).unwrap(),
            HostValue::bool_array(&[false, true])
        );
    }

    #[test]
    fn test_array_from_otf_rejects_non_arrays() {
        let host = MemoryHost::new();
        let list = host.alloc(HostValue::from(vec![1.0, 2.0]));
        let err = host
            .array_from_otf(list, DType::Float64, ArrayRequirements::IN_ARRAY)
            .unwrap_err();
        assert!(matches!(err, BridgeError::ConversionFailed { .. }));
    }

    #[test]
    fn test_array_allocation_limit() {
        let host = MemoryHost::with_config(HostConfig::new().with_max_array_len(8));
        assert!(host.array_new(DType::Float64, 8).is_ok());
        let err = host.array_new(DType::Float64, 9).unwrap_err();
        assert_eq!(err, BridgeError::allocation_failed("array", 9, 8));
    }

    #[test]
    fn test_list_new_placeholders() {
        let host = MemoryHost::new();
        let list = host.list_new(3).unwrap();
        assert_eq!(
            host.snapshot(list).unwrap(),
            HostValue::List(vec![HostValue::None, HostValue::None, HostValue::None])
        );
        assert_eq!(host.refcount(host.none()), Some(4));
        host.decref(list);
        assert_eq!(host.refcount(host.none()), Some(1));

        let zeros = MemoryHost::with_config(HostConfig::new().with_list_placeholder(Placeholder::Zero));
        let list = zeros.list_new(2).unwrap();
        assert_eq!(zeros.snapshot(list).unwrap(), HostValue::from(vec![0, 0]));
    }

    #[test]
    fn test_list_set_steals_on_failure() {
        let host = MemoryHost::new();
        let list = host.list_new(1).unwrap();
        let item = host.float_new(2.5).unwrap();

        let err = host.list_set(list, 4, item).unwrap_err();
        assert_eq!(err, BridgeError::index_out_of_range(4, 1));
        assert!(!host.is_alive(item));
    }

    #[test]
    fn test_list_append_does_not_steal() {
        let host = MemoryHost::new();
        let list = host.list_new(0).unwrap();
        let item = host.int_new(42).unwrap();

        host.list_append(list, item).unwrap();
        assert_eq!(host.refcount(item), Some(2));
        host.decref(item);
        assert_eq!(host.list_len(list).unwrap(), 1);
        assert_eq!(host.as_i64(host.list_get(list, 0).unwrap()).unwrap(), 42);
    }

    #[test]
    fn test_coercion() {
        let host = MemoryHost::new();
        let f = host.alloc(3.5);
        let n = host.alloc(42);
        let s = host.alloc("abc");

        assert_eq!(host.as_f64(f).unwrap(), 3.5);
        assert_eq!(host.as_f64(n).unwrap(), 42.0);
        assert_eq!(host.as_i64(n).unwrap(), 42);
        assert!(matches!(host.as_i64(f), Err(BridgeError::CoercionFailed { .. })));
        assert!(matches!(host.as_f64(s), Err(BridgeError::CoercionFailed { .. })));
    }

    #[test]
    fn test_require_gil() {
        let host = MemoryHost::with_config(HostConfig::new().with_require_gil(true));
        assert!(matches!(
            host.list_new(0),
            Err(BridgeError::GilNotHeld { .. })
        ));

        let _gil = GilGuard::acquire();
        let list = host.list_new(0).unwrap();
        host.decref(list);
    }
}
