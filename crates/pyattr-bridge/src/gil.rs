//! Caller-Held Critical Section
//!
//! The host runtime's object graph is serialized by a single global lock
//! (the GIL) that the *caller* holds for the whole sequence of bridge calls.
//! The wrappers in this crate never lock anything themselves; this module
//! only lets a caller mark the section and lets a host verify it.
//!
//! - **GilGuard**: RAII marker for the critical section, nestable
//! - **GilState**: thread-local query of the current state

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{BridgeError, BridgeResult};

// ============================================================================
// Lock State Tracking
// ============================================================================

thread_local! {
    /// Thread-local hold count
    static GIL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// State of the host lock for the current thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GilState {
    /// Lock is not held by this thread
    NotHeld,
    /// Lock is held by this thread
    Held,
}

impl GilState {
    /// Get the current state for this thread
    pub fn current() -> Self {
        if Self::is_held() {
            GilState::Held
        } else {
            GilState::NotHeld
        }
    }

    /// Check if the lock is currently held
    pub fn is_held() -> bool {
        Self::depth() > 0
    }

    /// Get the current nesting depth
    pub fn depth() -> usize {
        GIL_DEPTH.with(|depth| depth.get())
    }
}

impl fmt::Display for GilState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GilState::NotHeld => write!(f, "NotHeld"),
            GilState::Held => write!(f, "Held"),
        }
    }
}

// ============================================================================
// GilGuard - RAII Critical Section
// ============================================================================

/// RAII marker for the caller-held critical section.
///
/// Entering increments the thread-local depth, dropping decrements it.
///
/// ```
/// use pyattr_bridge::gil::{GilGuard, GilState};
///
/// {
///     let _gil = GilGuard::acquire();
///     assert!(GilState::is_held());
/// }
/// assert!(!GilState::is_held());
/// ```
#[derive(Debug)]
pub struct GilGuard {
    /// State when we entered
    previous_state: GilState,
    /// Marker to prevent Send/Sync
    _marker: PhantomData<*mut ()>,
}

impl GilGuard {
    /// Enter the critical section.
    ///
    /// If this thread already holds it, only the nesting depth grows.
    pub fn acquire() -> Self {
        let previous_state = GilState::current();
        GIL_DEPTH.with(|depth| depth.set(depth.get() + 1));
        tracing::trace!(depth = GilState::depth(), "host lock entered");

        Self {
            previous_state,
            _marker: PhantomData,
        }
    }

    /// Check if this is a nested acquisition
    pub fn is_nested(&self) -> bool {
        self.previous_state == GilState::Held
    }
}

impl Drop for GilGuard {
    fn drop(&mut self) {
        GIL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

// ============================================================================
// Contract Checks
// ============================================================================

/// Fail with [`BridgeError::GilNotHeld`] unless the current thread is inside
/// a [`GilGuard`].
pub fn ensure_held(context: &str) -> BridgeResult<()> {
    if GilState::is_held() {
        Ok(())
    } else {
        Err(BridgeError::gil_not_held(context))
    }
}
