//! # Core Error Types
//!
//! Every failure the runtime can report. Only [`CoreError::NotFound`] is
//! ever handed back to a caller; the remaining variants describe violated
//! structural invariants and go through [`fatal`].

use thiserror::Error;

/// Errors that can occur in the entity / action runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A query or mutation addressed a kind that is not currently attached.
    #[error("not found: no `{kind}` attached")]
    NotFound {
        /// Type name of the missing kind.
        kind: &'static str,
    },

    /// A fixed, build-time limit was exceeded.
    #[error("capacity exceeded: {what} (limit {limit})")]
    CapacityExceeded {
        /// What ran out of room.
        what: &'static str,
        /// The static limit that was hit.
        limit: usize,
    },

    /// An instance was bound to a heap slot twice.
    #[error("double binding: instance already bound to heap element {index}")]
    DoubleBinding {
        /// The element the instance is already bound to.
        index: usize,
    },

    /// Any other misuse of a pool, storage or batch invariant.
    #[error("invariant violated: {detail}")]
    Misuse {
        /// What was violated.
        detail: &'static str,
    },

    /// A layout read or write outside the allocated heap region.
    #[error("bounds violation: element {element} spans bytes {start}..{end} of a {len}-byte buffer")]
    BoundsViolation {
        /// Element index that was addressed.
        element: usize,
        /// First byte touched.
        start: usize,
        /// One past the last byte touched.
        end: usize,
        /// Length of the buffer.
        len: usize,
    },
}

impl CoreError {
    /// Builds a [`CoreError::NotFound`] for type `T`.
    #[must_use]
    pub fn not_found<T: ?Sized>() -> Self {
        Self::NotFound {
            kind: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` for the only recoverable variant.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for runtime operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Reports a violated structural invariant and stops.
///
/// The error is logged first so that aborting release builds still leave
/// a diagnostic behind.
#[cold]
#[track_caller]
pub fn fatal(error: CoreError) -> ! {
    tracing::error!(%error, "fatal runtime error");
    panic!("{error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_kind() {
        let err = CoreError::not_found::<u32>();
        assert_eq!(err.to_string(), "not found: no `u32` attached");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fatal_classes_are_not_recoverable() {
        let err = CoreError::CapacityExceeded {
            what: "batch members",
            limit: 4,
        };
        assert!(!err.is_recoverable());
        assert!(!CoreError::DoubleBinding { index: 3 }.is_recoverable());
    }

    #[test]
    #[should_panic(expected = "double binding")]
    fn test_fatal_panics_with_display_text() {
        fatal(CoreError::DoubleBinding { index: 7 });
    }
}
