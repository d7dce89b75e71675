//! GridError: Unified error type for seismo-grid public APIs
//!
//! Every fallible operation in the crate reports through this type. Nothing
//! in the library terminates the process on its own; the fatal-abort policy
//! is applied by the caller through [`crate::driver::OrAbort`].

use thiserror::Error;

/// Unified error type for seismo-grid operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The backing buffer of an array could not be allocated.
    #[error("allocation failure in {what}: could not reserve {elements} elements")]
    Allocation { what: &'static str, elements: usize },
    /// An axis was declared with `upper < lower - 1`.
    #[error("invalid bounds on axis {axis}: [{lower}..={upper}]")]
    InvalidBounds {
        axis: usize,
        lower: isize,
        upper: isize,
    },
    /// The product of the axis extents does not fit in `usize`.
    #[error("array extents {0:?} overflow the addressable size")]
    SizeOverflow(Vec<usize>),
    /// A supplied buffer does not match the element count of its bounds.
    #[error("buffer holds {found} elements but bounds require {expected}")]
    LengthMismatch { expected: usize, found: usize },
    /// The global grid cannot be tiled by the process grid.
    #[error("axis {axis}: global extent {global} is not a positive multiple of {procs} processes")]
    InvalidDecomposition {
        axis: usize,
        global: usize,
        procs: usize,
    },
    /// A rank outside `0..size` was requested.
    #[error("rank {rank} is out of range for a world of {size} processes")]
    RankOutOfRange { rank: usize, size: usize },
    /// A receiver coordinate lies outside the global grid.
    #[error("receiver {index} at {coord:?} lies outside the global grid")]
    ReceiverOutsideGrid { index: usize, coord: [isize; 3] },
    /// A seismogram matrix does not have the shape the collective expects.
    #[error("seismogram shape mismatch: expected {expected:?} (traces, samples), found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A time sample outside `1..=ns` was requested.
    #[error("sample index {index} outside 1..={ns}")]
    SampleOutOfRange { index: usize, ns: usize },
    /// The local state lacks a field the seismogram mode needs.
    #[error("local state is missing `{0}` required by the seismogram mode")]
    MissingField(&'static str),
    /// Parameter file could not be parsed or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
    /// An invariant check failed.
    #[error("invariant violated: {0}")]
    Invariant(String),
    /// MPI could not be initialised.
    #[error("MPI initialisation failed")]
    MpiInit,
}

static_assertions::assert_impl_all!(GridError: Eq, Clone, Send, Sync);
