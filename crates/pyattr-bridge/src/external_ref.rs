//! Counted References
//!
//! [`ExternalRef`] is the owning guard for one host reference: it holds
//! exactly one count on its object and gives it back exactly once, on drop
//! or on an explicit [`release`](ExternalRef::release). It is move-only;
//! duplicating ownership takes an explicit [`clone_ref`](ExternalRef::clone_ref).
//!
//! [`BorrowedRef`] is the non-owning counterpart, handed out by sequence
//! reads. Its lifetime is tied to whatever keeps the object alive, so it
//! cannot outlive the list it came from.

use std::fmt;
use std::mem::ManuallyDrop;

use smol_str::SmolStr;

use crate::conversion::IntoHostObject;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostRuntime, ObjHandle};

/// Owned, possibly null, reference to a host object.
pub struct ExternalRef<'h, H: HostRuntime> {
    host: &'h H,
    handle: Option<ObjHandle>,
}

impl<'h, H: HostRuntime> ExternalRef<'h, H> {
    /// Take over a reference the caller already owns. No count is added.
    pub fn from_owned(host: &'h H, handle: Option<ObjHandle>) -> Self {
        Self { host, handle }
    }

    /// Start owning a borrowed reference by adding one count.
    pub fn from_borrowed(host: &'h H, handle: ObjHandle) -> Self {
        host.incref(handle);
        tracing::trace!(%handle, "reference acquired");
        Self {
            host,
            handle: Some(handle),
        }
    }

    pub fn null(host: &'h H) -> Self {
        Self { host, handle: None }
    }

    /// Look up `name` on a raw parent handle.
    pub fn try_lookup(host: &'h H, parent: ObjHandle, name: &str) -> BridgeResult<Self> {
        let handle = host.get_attr(parent, name)?;
        tracing::trace!(%parent, name, %handle, "attribute acquired");
        Ok(Self::from_owned(host, Some(handle)))
    }

    /// Look up `name` on a raw parent handle; a failed lookup yields a null
    /// reference.
    pub fn lookup(host: &'h H, parent: ObjHandle, name: &str) -> Self {
        Self::try_lookup(host, parent, name).unwrap_or_else(|error| {
            tracing::debug!(%parent, name, %error, "attribute lookup failed");
            Self::null(host)
        })
    }

    /// Look up `name` on the object this reference points to.
    pub fn try_attr(&self, name: &str) -> BridgeResult<Self> {
        let parent = self.require(name)?;
        Self::try_lookup(self.host, parent, name)
    }

    /// Look up `name` on the object this reference points to; null on failure.
    pub fn attr(&self, name: &str) -> Self {
        match self.handle {
            Some(parent) => Self::lookup(self.host, parent, name),
            None => Self::null(self.host),
        }
    }

    /// Bind `name` on this object to `value`.
    pub fn set_attr<V>(&self, name: &str, value: V) -> BridgeResult<()>
    where
        V: IntoHostObject<'h, H>,
    {
        let parent = self.require(name)?;
        let value = value.into_host_object(self.host)?;
        let handle = value.require(name)?;
        self.host.set_attr(parent, name, handle)
    }

    /// Coerce attribute `name` to a float.
    pub fn attr_f64(&self, name: &str) -> BridgeResult<f64> {
        self.try_attr(name)?.as_f64()
    }

    /// Coerce attribute `name` to an integer.
    pub fn attr_i64(&self, name: &str) -> BridgeResult<i64> {
        self.try_attr(name)?.as_i64()
    }

    pub fn as_f64(&self) -> BridgeResult<f64> {
        self.host.as_f64(self.require("float coercion")?)
    }

    pub fn as_i64(&self) -> BridgeResult<i64> {
        self.host.as_i64(self.require("integer coercion")?)
    }

    pub fn host(&self) -> &'h H {
        self.host
    }

    pub fn handle(&self) -> Option<ObjHandle> {
        self.handle
    }

    /// The handle, or [`BridgeError::NullObject`] naming `context`.
    pub fn require(&self, context: &str) -> BridgeResult<ObjHandle> {
        self.handle.ok_or_else(|| BridgeError::null_object(context))
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn type_name(&self) -> Option<SmolStr> {
        self.handle.map(|h| self.host.type_name(h))
    }

    /// A second owner of the same object.
    pub fn clone_ref(&self) -> Self {
        match self.handle {
            Some(handle) => Self::from_borrowed(self.host, handle),
            None => Self::null(self.host),
        }
    }

    /// A non-owning view of this reference.
    pub fn borrow(&self) -> Option<BorrowedRef<'_, H>> {
        self.handle.map(|handle| BorrowedRef {
            host: self.host,
            handle,
        })
    }

    /// Give up ownership without releasing. The caller now owns the count.
    pub fn into_raw(self) -> Option<ObjHandle> {
        let this = ManuallyDrop::new(self);
        this.handle
    }

    /// Release the count now. Calling it again, or dropping afterwards, is
    /// a no-op.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::trace!(%handle, "reference released");
            self.host.decref(handle);
        }
    }
}

impl<H: HostRuntime> Drop for ExternalRef<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<H: HostRuntime> fmt::Debug for ExternalRef<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle {
            Some(handle) => write!(f, "ExternalRef({})", handle),
            None => write!(f, "ExternalRef(null)"),
        }
    }
}

/// Non-owning reference, valid while its owner keeps the object alive.
pub struct BorrowedRef<'a, H: HostRuntime> {
    host: &'a H,
    handle: ObjHandle,
}

impl<'a, H: HostRuntime> BorrowedRef<'a, H> {
    pub(crate) fn new(host: &'a H, handle: ObjHandle) -> Self {
        Self { host, handle }
    }

    pub fn handle(&self) -> ObjHandle {
        self.handle
    }

    pub fn host(&self) -> &'a H {
        self.host
    }

    /// Promote to an owned reference (adds one count).
    pub fn to_owned(&self) -> ExternalRef<'a, H> {
        ExternalRef::from_borrowed(self.host, self.handle)
    }

    pub fn as_f64(&self) -> BridgeResult<f64> {
        self.host.as_f64(self.handle)
    }

    pub fn as_i64(&self) -> BridgeResult<i64> {
        self.host.as_i64(self.handle)
    }

    pub fn type_name(&self) -> SmolStr {
        self.host.type_name(self.handle)
    }
}

impl<H: HostRuntime> Clone for BorrowedRef<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: HostRuntime> Copy for BorrowedRef<'_, H> {}

impl<H: HostRuntime> fmt::Debug for BorrowedRef<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BorrowedRef({})", self.handle)
    }
}
