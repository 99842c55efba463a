//! Value Conversion into the Host
//!
//! [`IntoHostObject`] turns a Rust value into an owned host reference. It is
//! what lets sequence writes and attribute writes accept plain numbers as
//! well as existing references:
//!
//! - `f64` becomes a new host float, `i64`/`i32` a new host integer,
//!   `bool` a new host boolean
//! - an owned [`ExternalRef`] is passed through (ownership moves in)
//! - a `&ExternalRef` or a [`BorrowedRef`] gains a count of its own

use crate::error::{BridgeError, BridgeResult};
use crate::external_ref::{BorrowedRef, ExternalRef};
use crate::host::HostRuntime;

/// Conversion of a value into an owned, non-null host reference.
pub trait IntoHostObject<'h, H: HostRuntime> {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>>;
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for f64 {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        Ok(ExternalRef::from_owned(host, Some(host.float_new(self)?)))
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for i64 {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        Ok(ExternalRef::from_owned(host, Some(host.int_new(self)?)))
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for i32 {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        i64::from(self).into_host_object(host)
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for bool {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        Ok(ExternalRef::from_owned(host, Some(host.bool_new(self)?)))
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for ExternalRef<'h, H> {
    fn into_host_object(self, _host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        if self.is_null() {
            return Err(BridgeError::null_object("value conversion"));
        }
        Ok(self)
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for &ExternalRef<'_, H> {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        let handle = self.require("value conversion")?;
        Ok(ExternalRef::from_borrowed(host, handle))
    }
}

impl<'h, H: HostRuntime> IntoHostObject<'h, H> for BorrowedRef<'_, H> {
    fn into_host_object(self, host: &'h H) -> BridgeResult<ExternalRef<'h, H>> {
        Ok(ExternalRef::from_borrowed(host, self.handle()))
    }
}
