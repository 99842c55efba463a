//! Dynamic Lists
//!
//! [`DynamicList`] wraps a host list: either a new one with a fixed number
//! of placeholder slots, or a list read from an attribute. Items go in
//! through [`set_item`](DynamicList::set_item) (replace a slot) and
//! [`append`](DynamicList::append) (grow by one); both accept anything that
//! implements [`IntoHostObject`].
//!
//! The host's two write primitives treat the item's count differently:
//! slot assignment takes ownership of it, append adds a count of its own.
//! The wrapper hides the difference, so each call leaves every object's
//! count balanced whether it succeeds or fails.

use std::fmt;

use crate::conversion::IntoHostObject;
use crate::error::{BridgeError, BridgeResult};
use crate::external_ref::{BorrowedRef, ExternalRef};
use crate::host::{HostRuntime, ObjHandle};

/// Owned handle to a host list.
pub struct DynamicList<'h, H: HostRuntime> {
    list: ExternalRef<'h, H>,
}

impl<'h, H: HostRuntime> DynamicList<'h, H> {
    /// A new list of `size` placeholder slots; invalid if the host refuses.
    pub fn new(host: &'h H, size: usize) -> Self {
        Self::try_new(host, size).unwrap_or_else(|error| {
            tracing::debug!(size, %error, "list allocation failed");
            Self {
                list: ExternalRef::null(host),
            }
        })
    }

    pub fn try_new(host: &'h H, size: usize) -> BridgeResult<Self> {
        let handle = host.list_new(size)?;
        tracing::trace!(list = %handle, size, "list created");
        Ok(Self {
            list: ExternalRef::from_owned(host, Some(handle)),
        })
    }

    /// A new list with no slots.
    pub fn empty(host: &'h H) -> Self {
        Self::new(host, 0)
    }

    /// Wrap an existing reference. A null reference gives an invalid list.
    pub fn from_ref(list: ExternalRef<'h, H>) -> Self {
        Self { list }
    }

    /// The list stored in attribute `name`; invalid on a failed lookup.
    pub fn from_attr(host: &'h H, parent: ObjHandle, name: &str) -> Self {
        Self::from_ref(ExternalRef::lookup(host, parent, name))
    }

    pub fn try_from_attr(host: &'h H, parent: ObjHandle, name: &str) -> BridgeResult<Self> {
        ExternalRef::try_lookup(host, parent, name).map(Self::from_ref)
    }

    pub fn from_attr_of(parent: &ExternalRef<'h, H>, name: &str) -> Self {
        Self::from_ref(parent.attr(name))
    }

    pub fn try_from_attr_of(parent: &ExternalRef<'h, H>, name: &str) -> BridgeResult<Self> {
        parent.try_attr(name).map(Self::from_ref)
    }

    pub fn is_valid(&self) -> bool {
        self.list.is_valid()
    }

    pub fn host(&self) -> &'h H {
        self.list.host()
    }

    pub fn len(&self) -> BridgeResult<usize> {
        self.host().list_len(self.list.require("list length")?)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// The item at `index`, borrowed from the list.
    ///
    /// The borrow keeps the list borrowed too, so the slot cannot be
    /// replaced while the item is in use. Use [`get_owned`](Self::get_owned)
    /// to keep an item past a later [`set_item`](Self::set_item), or when
    /// another wrapper of the same host list may replace it.
    pub fn get(&self, index: usize) -> BridgeResult<BorrowedRef<'_, H>> {
        let list = self.list.require("list read")?;
        let item = self.host().list_get(list, index)?;
        Ok(BorrowedRef::new(self.host(), item))
    }

    /// The item at `index`, with a count of its own.
    pub fn get_owned(&self, index: usize) -> BridgeResult<ExternalRef<'h, H>> {
        let item = self.get(index)?.handle();
        Ok(ExternalRef::from_borrowed(self.host(), item))
    }

    pub fn get_f64(&self, index: usize) -> BridgeResult<f64> {
        self.get(index)?.as_f64()
    }

    pub fn get_i64(&self, index: usize) -> BridgeResult<i64> {
        self.get(index)?.as_i64()
    }

    /// Replace the item at `index`.
    ///
    /// The list takes over the converted value's count; the previous item
    /// loses the list's count. On failure nothing changes and the converted
    /// value is released.
    ///
    /// Takes the list mutably, since the previous item may be freed: a
    /// borrowed item cannot be held across the call.
    ///
    /// ```compile_fail
    /// use pyattr_bridge::host::memory::MemoryHost;
    /// use pyattr_bridge::DynamicList;
    ///
    /// let host = MemoryHost::new();
    /// let mut list = DynamicList::new(&host, 1);
    /// let item = list.get(0).unwrap();
    /// list.set_item(0, 2.5).unwrap();
    /// item.as_f64().unwrap();
    /// ```
    pub fn set_item<V>(&mut self, index: usize, value: V) -> BridgeResult<()>
    where
        V: IntoHostObject<'h, H>,
    {
        let list = self.list.require("list write")?;
        let Some(item) = value.into_host_object(self.host())?.into_raw() else {
            return Err(BridgeError::null_object("list write"));
        };
        tracing::trace!(%list, index, %item, "list item set");
        self.host().list_set(list, index, item)
    }

    /// Grow the list by one item.
    ///
    /// The list adds a count of its own to the item; the converted value's
    /// count is released afterwards, success or not.
    pub fn append<V>(&self, value: V) -> BridgeResult<()>
    where
        V: IntoHostObject<'h, H>,
    {
        let list = self.list.require("list append")?;
        let item = value.into_host_object(self.host())?;
        let handle = item.require("list append")?;
        tracing::trace!(%list, item = %handle, "list item appended");
        self.host().list_append(list, handle)
    }

    /// Borrow every item in order.
    pub fn iter(&self) -> Iter<'_, 'h, H> {
        Iter {
            list: self,
            index: 0,
        }
    }

    /// Every item coerced to a float.
    pub fn to_f64_vec(&self) -> BridgeResult<Vec<f64>> {
        self.iter().map(|item| item?.as_f64()).collect()
    }

    pub fn as_external(&self) -> &ExternalRef<'h, H> {
        &self.list
    }

    pub fn into_external(self) -> ExternalRef<'h, H> {
        self.list
    }
}

impl<H: HostRuntime> fmt::Debug for DynamicList<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynamicList").field(&self.list).finish()
    }
}

/// Iterator over a [`DynamicList`], yielding borrowed items.
///
/// The length is re-read on every step, so items appended while iterating
/// are visited too.
pub struct Iter<'a, 'h, H: HostRuntime> {
    list: &'a DynamicList<'h, H>,
    index: usize,
}

impl<'a, H: HostRuntime> Iterator for Iter<'a, '_, H> {
    type Item = BridgeResult<BorrowedRef<'a, H>>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = match self.list.len() {
            Ok(len) => len,
            Err(error) => {
                // Yield the error once, then stop.
                self.index = usize::MAX;
                return Some(Err(error));
            }
        };
        if self.index >= len {
            return None;
        }
        let item = self.list.get(self.index);
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostConfig, Placeholder};
    use crate::host::memory::MemoryHost;
    use crate::host::value::HostValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_list_placeholders() {
        let host = MemoryHost::new();
        let list = DynamicList::new(&host, 3);
        assert!(list.is_valid());
        assert_eq!(list.len().unwrap(), 3);
        assert_eq!(list.get(0).unwrap().handle(), host.none());

        let zeros = MemoryHost::with_config(HostConfig::new().with_list_placeholder(Placeholder::Zero));
        let list = DynamicList::new(&zeros, 2);
        assert_eq!(list.get_i64(1).unwrap(), 0);
    }

    #[test]
    fn test_empty_and_append() {
        let host = MemoryHost::new();
        let list = DynamicList::empty(&host);
        assert!(list.is_empty().unwrap());

        list.append(1.5).unwrap();
        list.append(7_i64).unwrap();
        list.append(true).unwrap();
        assert_eq!(list.len().unwrap(), 3);
        assert_eq!(list.to_f64_vec().unwrap(), vec![1.5, 7.0, 1.0]);

        let item = list.get(0).unwrap().handle();
        assert_eq!(host.refcount(item), Some(1));
    }

    #[test]
    fn test_append_existing_reference() {
        let host = MemoryHost::new();
        let obj = ExternalRef::from_owned(&host, Some(host.alloc(2.0)));
        let list = DynamicList::empty(&host);

        list.append(&obj).unwrap();
        assert_eq!(host.refcount(obj.handle().unwrap()), Some(2));
        drop(list);
        assert_eq!(host.refcount(obj.handle().unwrap()), Some(1));
    }

    #[test]
    fn test_set_item() {
        let host = MemoryHost::new();
        let mut list = DynamicList::new(&host, 2);
        let none_before = host.refcount(host.none()).unwrap();

        list.set_item(0, 3.5).unwrap();
        list.set_item(1, 4_i32).unwrap();
        assert_eq!(list.get_f64(0).unwrap(), 3.5);
        assert_eq!(list.get_i64(1).unwrap(), 4);
        assert_eq!(host.refcount(host.none()), Some(none_before - 2));
        assert_eq!(host.refcount(list.get(0).unwrap().handle()), Some(1));
    }

    #[test]
    fn test_set_item_out_of_range_releases_value() {
        let host = MemoryHost::new();
        let mut list = DynamicList::new(&host, 1);
        let live = host.live_objects();

        assert_eq!(
            list.set_item(5, 1.0),
            Err(BridgeError::index_out_of_range(5, 1))
        );
        assert_eq!(list.len().unwrap(), 1);
        assert_eq!(host.live_objects(), live);
    }

    #[test]
    fn test_owned_item_survives_replacement() {
        let host = MemoryHost::new();
        let mut list = DynamicList::empty(&host);
        list.append(1.5).unwrap();

        let item = list.get_owned(0).unwrap();
        let handle = item.handle().unwrap();
        assert_eq!(host.refcount(handle), Some(2));

        list.set_item(0, 2.5).unwrap();
        assert_eq!(host.refcount(handle), Some(1));
        assert_eq!(item.as_f64().unwrap(), 1.5);
        assert_eq!(list.get_f64(0).unwrap(), 2.5);

        drop(item);
        assert!(!host.is_alive(handle));
        assert_eq!(host.stats().invalid_increfs, 0);
        assert_eq!(host.stats().invalid_decrefs, 0);
    }

    #[test]
    fn test_from_attr() {
        let host = MemoryHost::new();
        let root = host.alloc(HostValue::instance("Scenario").with_attr("cmds", vec![1, 2]));

        let cmds = DynamicList::from_attr(&host, root, "cmds");
        assert_eq!(cmds.len().unwrap(), 2);
        assert_eq!(cmds.get_i64(1).unwrap(), 2);

        let missing = DynamicList::from_attr(&host, root, "missing");
        assert!(!missing.is_valid());
        assert!(matches!(missing.len(), Err(BridgeError::NullObject { .. })));
        assert!(DynamicList::try_from_attr(&host, root, "missing").is_err());
    }

    #[test]
    fn test_list_limit() {
        let host = MemoryHost::with_config(HostConfig::new().with_max_list_len(1));
        assert!(!DynamicList::new(&host, 2).is_valid());

        let list = DynamicList::new(&host, 1);
        let live = host.live_objects();
        assert!(matches!(
            list.append(1.0),
            Err(BridgeError::AllocationFailed { .. })
        ));
        assert_eq!(host.live_objects(), live);
    }

    #[test]
    fn test_iter() {
        let host = MemoryHost::new();
        let list = DynamicList::empty(&host);
        for i in 0..4_i64 {
            list.append(i).unwrap();
        }
        let values: Vec<i64> = list
            .iter()
            .map(|item| item.and_then(|b| b.as_i64()).unwrap())
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }
}
