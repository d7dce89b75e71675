//! All-or-nothing failure policy for distributed runs.
//!
//! Library operations return [`GridError`]. A lock-step run cannot continue
//! with one rank missing, and a rank that simply exits would leave the
//! others blocked in the next collective forever. The top-level driver
//! therefore funnels fatal errors through [`OrAbort`], which reports the
//! failure and takes the whole world down.

use crate::algs::communicator::Communicator;
use crate::grid_error::GridError;

/// Exit code passed to [`Communicator::abort`].
pub const ABORT_CODE: i32 = 1;

/// Unwrap a result or abort every rank.
pub trait OrAbort<T> {
    /// Return the value, or log a diagnostic naming this rank and
    /// `operation` and abort the world.
    fn or_abort<C: Communicator>(self, comm: &C, operation: &str) -> T;
}

impl<T> OrAbort<T> for Result<T, GridError> {
    fn or_abort<C: Communicator>(self, comm: &C, operation: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                log::error!(
                    "Message from PE {}: run-time error in {operation}: {e}; \
                     aborting all {} processes",
                    comm.rank(),
                    comm.size()
                );
                comm.abort(ABORT_CODE)
            }
        }
    }
}
