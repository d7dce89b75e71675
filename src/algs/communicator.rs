//! Thin façade over inter-process (MPI) or in-process (thread) collectives.
//!
//! The seismogram pipeline needs very little from the message layer: rank
//! and size, an element-wise sum across ranks, a barrier, and a way to take
//! every rank down when one of them hits a fatal error.
//!
//! Backends:
//! - [`NoComm`]: serial, rank 0 of 1.
//! - [`ThreadComm`]: a world of ranks living on threads of one process,
//!   used by the multi-rank tests.
//! - `MpiComm` (feature `mpi-support`): the real thing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::algs::wire::{cast_slice, collect_from_bytes, expect_exact_len, WireScalar};

/// Collective communication interface.
///
/// Every method except `rank`/`size` is collective: all ranks of the world
/// must call it in the same order with matching arguments, or the run
/// deadlocks or produces garbage. There are no timeouts.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Block until every rank has arrived.
    fn barrier(&self);

    /// Replace `buf` on every rank with the element-wise sum of all ranks'
    /// `buf`. The result is bit-identical on every rank.
    fn allreduce_sum<T: WireScalar>(&self, buf: &mut [T]);

    /// Terminate every rank of the world. Never returns.
    fn abort(&self, code: i32) -> !;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Block until the payload is available; `None` if the world aborted
    /// first.
    fn wait(self) -> Option<Bytes>;
}

/// Serial communicator: a world of one.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn allreduce_sum<T: WireScalar>(&self, _buf: &mut [T]) {}

    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

// --- ThreadComm: ranks on threads of one process ---

type Key = (u64, usize, usize, u16); // (world, src, dst, tag)

static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);
static NEXT_WORLD: AtomicU64 = AtomicU64::new(1);

const NOT_ABORTED: usize = usize::MAX;

#[derive(Debug)]
struct ThreadWorld {
    id: u64,
    size: usize,
    /// Rank that aborted the world, or `NOT_ABORTED`.
    aborted_by: AtomicUsize,
}

impl ThreadWorld {
    fn aborted_by(&self) -> Option<usize> {
        match self.aborted_by.load(Ordering::Acquire) {
            NOT_ABORTED => None,
            r => Some(r),
        }
    }
}

/// One rank of an in-process world.
///
/// Create a whole world with [`ThreadComm::world`] and move each handle onto
/// its own thread. Sums are accumulated in rank order, so every rank gets
/// the same bits. [`Communicator::abort`] marks the world as aborted and
/// panics; every rank blocked in (or later entering) a collective panics
/// too, so no thread is left waiting forever.
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    world: Arc<ThreadWorld>,
    epoch: AtomicU16,
}

impl ThreadComm {
    /// Handles for ranks `0..size` of a fresh world.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "a world needs at least one rank");
        let world = Arc::new(ThreadWorld {
            id: NEXT_WORLD.fetch_add(1, Ordering::Relaxed),
            size,
            aborted_by: AtomicUsize::new(NOT_ABORTED),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                world: Arc::clone(&world),
                epoch: AtomicU16::new(0),
            })
            .collect()
    }

    /// Each collective call gets its own tag; all ranks advance in lock-step.
    fn next_tag(&self) -> u16 {
        self.epoch.fetch_add(1, Ordering::Relaxed)
    }

    fn isend(&self, peer: usize, tag: u16, payload: Bytes) {
        let key = (self.world.id, self.rank, peer, tag);
        MAILBOX.entry(key).or_default().push_back(payload);
    }

    fn irecv(&self, peer: usize, tag: u16) -> LocalHandle {
        LocalHandle {
            key: (self.world.id, peer, self.rank, tag),
            world: Arc::clone(&self.world),
        }
    }

    fn world_aborted(&self) -> ! {
        let by = self.world.aborted_by().unwrap_or(self.rank);
        panic!("rank {}: world aborted by rank {by}", self.rank)
    }
}

pub struct LocalHandle {
    key: Key,
    world: Arc<ThreadWorld>,
}

impl LocalHandle {
    fn try_take(&self) -> Option<Bytes> {
        let popped = MAILBOX.get_mut(&self.key).and_then(|mut q| q.pop_front());
        if popped.is_some() {
            MAILBOX.remove_if(&self.key, |_, q| q.is_empty());
        }
        popped
    }
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Bytes> {
        loop {
            if let Some(bytes) = self.try_take() {
                return Some(bytes);
            }
            if self.world.aborted_by().is_some() {
                return None;
            }
            std::thread::yield_now();
        }
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.world.size
    }

    fn barrier(&self) {
        let mut token = [0i32];
        self.allreduce_sum(&mut token);
    }

    fn allreduce_sum<T: WireScalar>(&self, buf: &mut [T]) {
        if self.world.aborted_by().is_some() {
            self.world_aborted();
        }
        let tag = self.next_tag();
        log::trace!(
            "rank {}: allreduce_sum of {} elements (tag {tag})",
            self.rank,
            buf.len()
        );
        if self.world.size == 1 {
            return;
        }
        let payload = Bytes::copy_from_slice(cast_slice(buf));
        for peer in (0..self.world.size).filter(|&p| p != self.rank) {
            self.isend(peer, tag, payload.clone());
        }

        let mut acc = vec![T::zero(); buf.len()];
        for src in 0..self.world.size {
            if src == self.rank {
                acc.iter_mut().zip(buf.iter()).for_each(|(a, &b)| *a += b);
                continue;
            }
            let Some(bytes) = self.irecv(src, tag).wait() else {
                self.world_aborted();
            };
            if let Err(e) = expect_exact_len(bytes.len(), payload.len()) {
                panic!("rank {}: allreduce_sum from rank {src}: {e}", self.rank);
            }
            let part: Vec<T> = collect_from_bytes(&bytes);
            acc.iter_mut().zip(part).for_each(|(a, b)| *a += b);
        }
        buf.copy_from_slice(&acc);
    }

    fn abort(&self, code: i32) -> ! {
        let _ = self.world.aborted_by.compare_exchange(
            NOT_ABORTED,
            self.rank,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        panic!("rank {} aborted the world with code {code}", self.rank)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use mpi::collective::{CommunicatorCollectives, SystemOperation};
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::Communicator as MpiCommunicator;

    use crate::algs::wire::WireScalar;
    use crate::grid_error::GridError;

    /// MPI world communicator. Owns the MPI environment: dropping it
    /// finalizes MPI.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, GridError> {
            let universe = mpi::initialize().ok_or(GridError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    impl super::Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }

        fn allreduce_sum<T: WireScalar>(&self, buf: &mut [T]) {
            let send = buf.to_vec();
            self.world
                .all_reduce_into(&send[..], buf, SystemOperation::sum());
        }

        fn abort(&self, code: i32) -> ! {
            MpiCommunicator::abort(&self.world, code)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
