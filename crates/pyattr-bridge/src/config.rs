//! Host configuration.
//!
//! Tunables for [`MemoryHost`](crate::host::memory::MemoryHost), loadable
//! from TOML:
//!
//! ```toml
//! require_gil = true
//! max_array_len = 1_000_000
//! list_placeholder = "zero"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Initial content of the slots of a freshly created sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    /// The host's shared `None` object
    #[default]
    None,
    /// A new integer `0` per slot
    Zero,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Reject fallible primitives called outside a `GilGuard`.
    pub require_gil: bool,
    /// Largest array the host will allocate, in elements.
    pub max_array_len: Option<usize>,
    /// Largest sequence the host will create or grow to.
    pub max_list_len: Option<usize>,
    pub list_placeholder: Placeholder,
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_require_gil(mut self, require_gil: bool) -> Self {
        self.require_gil = require_gil;
        self
    }

    pub fn with_max_array_len(mut self, limit: usize) -> Self {
        self.max_array_len = Some(limit);
        self
    }

    pub fn with_max_list_len(mut self, limit: usize) -> Self {
        self.max_list_len = Some(limit);
        self
    }

    pub fn with_list_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.list_placeholder = placeholder;
        self
    }

    pub fn from_toml_str(source: &str) -> BridgeResult<Self> {
        toml::from_str(source).map_err(|e| BridgeError::config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> BridgeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BridgeError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}
