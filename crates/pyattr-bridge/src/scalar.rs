//! Scalar Accessors
//!
//! One-shot reads and writes of a single numeric attribute. A failed lookup
//! is reported as such; coercion is only attempted on an object that exists.

use crate::error::BridgeResult;
use crate::external_ref::ExternalRef;
use crate::host::HostRuntime;

/// Read attribute `name` of `parent` as a float.
///
/// ```
/// use pyattr_bridge::host::memory::MemoryHost;
/// use pyattr_bridge::host::value::HostValue;
/// use pyattr_bridge::{get_attr_f64, ExternalRef};
///
/// let host = MemoryHost::new();
/// let conf = host.alloc(HostValue::instance("Settings").with_attr("simdt", 0.05));
/// let conf = ExternalRef::from_owned(&host, Some(conf));
/// assert_eq!(get_attr_f64(&conf, "simdt").unwrap(), 0.05);
/// ```
pub fn get_attr_f64<H: HostRuntime>(parent: &ExternalRef<'_, H>, name: &str) -> BridgeResult<f64> {
    parent.try_attr(name)?.as_f64()
}

/// Read attribute `name` of `parent` as an integer. Floats are rejected.
pub fn get_attr_i64<H: HostRuntime>(parent: &ExternalRef<'_, H>, name: &str) -> BridgeResult<i64> {
    parent.try_attr(name)?.as_i64()
}

/// Bind attribute `name` of `parent` to a new float.
pub fn set_attr_f64<H: HostRuntime>(
    parent: &ExternalRef<'_, H>,
    name: &str,
    value: f64,
) -> BridgeResult<()> {
    parent.set_attr(name, value)
}

/// Bind attribute `name` of `parent` to a new integer.
pub fn set_attr_i64<H: HostRuntime>(
    parent: &ExternalRef<'_, H>,
    name: &str,
    value: i64,
) -> BridgeResult<()> {
    parent.set_attr(name, value)
}
