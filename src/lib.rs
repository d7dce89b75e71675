#![cfg_attr(docsrs, feature(doc_cfg))]
//! # seismo-grid
//!
//! seismo-grid is the structured-grid storage and receiver-data pipeline of a
//! distributed staggered-grid finite-difference seismic simulator. It provides
//! arbitrary-bound contiguous arrays for all simulation state, a Cartesian
//! domain decomposition with a single-owner rule, receiver sampling of
//! velocities, pressure, divergence and curl, and the collective that
//! reassembles global seismograms on every rank.
//!
//! ## Features
//! - `ArenaArray` in 1–4 dimensions: one zeroed buffer, any lower bound
//!   (halo indices such as `-1` address directly)
//! - `GridDecomposition`/`GridPartition`: every global point has exactly one
//!   owning rank, and local coordinates map back with `local + pos * n`
//! - `ReceiverSampler`: first-order stencils for divergence and curl
//! - `SeismogramCollector`: gather expressed as an element-wise sum
//! - Pluggable communication backends (serial, threads, MPI)
//! - `mpi-support` enables the MPI backend; `rayon` parallelises receiver
//!   probing; `check-invariants` keeps invariant checks in release builds
//!
//! ## Failure policy
//! Every fallible operation returns [`GridError`](grid_error::GridError).
//! Drivers decide what is fatal; [`driver::OrAbort`] aborts all ranks so none
//! is left blocked in a collective.

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod driver;
pub mod grid_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::collection::SeismogramCollector;
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm};
    pub use crate::algs::model::ElasticModel;
    pub use crate::algs::recording::SeismogramRecorder;
    pub use crate::algs::sampling::ReceiverSampler;
    pub use crate::config::{SeismoMode, SimulationContext};
    pub use crate::data::arena::{Array1, Array2, Array3, Array4, ArenaArray};
    pub use crate::data::bounds::Bounds;
    pub use crate::data::receivers::ReceiverSet;
    pub use crate::data::seismogram::{Quantity, SeismogramMatrix, SeismogramSet};
    pub use crate::data::wavefield::{LocalState, StressDiagonal, Velocity};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::driver::OrAbort;
    pub use crate::grid_error::GridError;
    pub use crate::topology::partition::{GlobalCoord, GridDecomposition, GridPartition, LocalCoord};
}
