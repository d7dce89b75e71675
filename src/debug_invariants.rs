//! Invariant checking shared by arrays, partitions and receiver tables.
//!
//! Hot paths never validate; structures are checked once after construction
//! in debug builds, or in release builds with the `check-invariants` feature.

use crate::grid_error::GridError;

/// Trait for validating structural invariants.
pub trait DebugInvariants {
    /// Panic on a violated invariant when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first violation found.
    fn validate_invariants(&self) -> Result<(), GridError>;
}

/// Turn a failed condition into [`GridError::Invariant`].
#[inline]
pub fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), GridError> {
    if cond {
        Ok(())
    } else {
        Err(GridError::Invariant(msg()))
    }
}

/// Run a fallible check and panic with context on error when invariant
/// checking is enabled. Compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
