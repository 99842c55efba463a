//! Error Types for the Attribute Bridge
//!
//! Every failure the bridge can report falls into one of a handful of
//! classes (see [`ErrorKind`]):
//!
//! - Lookup: a named attribute is absent, or the parent handle is null
//! - Conversion: an object cannot be materialized as the requested array
//! - Allocation: the host refused a new array or sequence
//! - Index: a sequence access outside `[0, len)`
//! - Coercion: a scalar conversion applied to a non-numeric object
//!
//! The remaining variants describe violations of the host contract itself
//! (wrong object type, dead handle, missing critical section).

use std::fmt;
use thiserror::Error;

use crate::host::ObjHandle;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Broad failure class of a [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lookup,
    Conversion,
    Allocation,
    Index,
    Coercion,
    Type,
    Lock,
    Ownership,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lookup => "lookup",
            ErrorKind::Conversion => "conversion",
            ErrorKind::Allocation => "allocation",
            ErrorKind::Index => "index",
            ErrorKind::Coercion => "coercion",
            ErrorKind::Type => "type",
            ErrorKind::Lock => "lock",
            ErrorKind::Ownership => "ownership",
            ErrorKind::Config => "config",
        };
        write!(f, "{}", name)
    }
}

/// Bridge error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Attribute not found on object
    #[error("attribute '{attribute}' not found on {object_type}")]
    AttributeNotFound {
        /// Name of the attribute
        attribute: String,
        /// Type of the object
        object_type: String,
    },

    /// Null handle used where an object was required
    #[error("null object: {context}")]
    NullObject {
        /// Context where null was encountered
        context: String,
    },

    /// Array materialization failed
    #[error("cannot convert {from_type} to {to_type}: {reason}")]
    ConversionFailed {
        /// Source type name
        from_type: String,
        /// Target type name
        to_type: String,
        /// Reason for failure
        reason: String,
    },

    /// The host could not satisfy an allocation request
    #[error("cannot allocate {what} of length {requested} (limit {limit})")]
    AllocationFailed {
        /// Kind of object requested
        what: String,
        /// Requested element count
        requested: usize,
        /// Configured limit
        limit: usize,
    },

    /// Sequence index outside `[0, len)`
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length at the time of the call
        len: usize,
    },

    /// Scalar coercion failed
    #[error("cannot coerce {from_type} to {to_type}")]
    CoercionFailed {
        /// Source type name
        from_type: String,
        /// Target scalar type
        to_type: String,
    },

    /// Operation applied to an object of the wrong type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Actual type received
        actual: String,
    },

    /// Host primitive called outside the caller-held critical section
    #[error("host lock not held: {context}")]
    GilNotHeld {
        /// Description of the operation that required the lock
        context: String,
    },

    /// Handle refers to an object the host has already freed
    #[error("object {handle} is not alive")]
    DeadObject {
        /// The stale handle
        handle: ObjHandle,
    },

    /// Invalid host configuration
    #[error("invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl BridgeError {
    /// Create an attribute not found error
    pub fn attribute_not_found(attribute: impl Into<String>, object_type: impl Into<String>) -> Self {
        BridgeError::AttributeNotFound {
            attribute: attribute.into(),
            object_type: object_type.into(),
        }
    }

    /// Create a null object error
    pub fn null_object(context: impl Into<String>) -> Self {
        BridgeError::NullObject {
            context: context.into(),
        }
    }

    /// Create a conversion failed error
    pub fn conversion_failed(
        from_type: impl Into<String>,
        to_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BridgeError::ConversionFailed {
            from_type: from_type.into(),
            to_type: to_type.into(),
            reason: reason.into(),
        }
    }

    /// Create an allocation failed error
    pub fn allocation_failed(what: impl Into<String>, requested: usize, limit: usize) -> Self {
        BridgeError::AllocationFailed {
            what: what.into(),
            requested,
            limit,
        }
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        BridgeError::IndexOutOfRange { index, len }
    }

    /// Create a coercion failed error
    pub fn coercion_failed(from_type: impl Into<String>, to_type: impl Into<String>) -> Self {
        BridgeError::CoercionFailed {
            from_type: from_type.into(),
            to_type: to_type.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a lock not held error
    pub fn gil_not_held(context: impl Into<String>) -> Self {
        BridgeError::GilNotHeld {
            context: context.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }

    /// The failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::AttributeNotFound { .. } | BridgeError::NullObject { .. } => {
                ErrorKind::Lookup
            }
            BridgeError::ConversionFailed { .. } => ErrorKind::Conversion,
            BridgeError::AllocationFailed { .. } => ErrorKind::Allocation,
            BridgeError::IndexOutOfRange { .. } => ErrorKind::Index,
            BridgeError::CoercionFailed { .. } => ErrorKind::Coercion,
            BridgeError::TypeMismatch { .. } => ErrorKind::Type,
            BridgeError::GilNotHeld { .. } => ErrorKind::Lock,
            BridgeError::DeadObject { .. } => ErrorKind::Ownership,
            BridgeError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Check if this is a lookup failure
    pub fn is_lookup_error(&self) -> bool {
        self.kind() == ErrorKind::Lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_error() {
        let err = BridgeError::attribute_not_found("lat", "Traffic");
        assert!(err.is_lookup_error());
        assert_eq!(err.to_string(), "attribute 'lat' not found on Traffic");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(BridgeError::null_object("getattr").kind(), ErrorKind::Lookup);
        assert_eq!(
            BridgeError::conversion_failed("float64", "bool", "unsafe cast").kind(),
            ErrorKind::Conversion
        );
        assert_eq!(
            BridgeError::allocation_failed("array", 10, 4).kind(),
            ErrorKind::Allocation
        );
        assert_eq!(BridgeError::index_out_of_range(3, 2).kind(), ErrorKind::Index);
        assert_eq!(
            BridgeError::coercion_failed("str", "float").kind(),
            ErrorKind::Coercion
        );
        assert_eq!(BridgeError::gil_not_held("list_new").kind(), ErrorKind::Lock);
    }

    #[test]
    fn test_index_message() {
        let err = BridgeError::index_out_of_range(5, 2);
        assert!(err.to_string().contains("index 5"));
        assert!(err.to_string().contains("length 2"));
    }
}
