//! Receiver table with per-rank ownership.
//!
//! Receivers keep their global order. A rank records only the receivers it
//! owns, and stores them *compacted*: local trace `k` (1-based) is the `k`-th
//! owned receiver in ascending global index. [`ReceiverSet::ownership_flags`]
//! is what the collector needs to undo that compaction.

use crate::debug_invariants::{ensure, DebugInvariants};
use crate::grid_error::GridError;
use crate::topology::partition::{GlobalCoord, GridPartition, LocalCoord};

/// One receiver as seen by the current rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Receiver {
    pub global: GlobalCoord,
    /// Local coordinate when this rank owns the receiver.
    pub local: Option<LocalCoord>,
}

/// An owned receiver in compacted order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnedReceiver {
    /// Row in the local seismogram, 1-based.
    pub local_trace: usize,
    /// Row in the global seismogram, 1-based.
    pub global_trace: usize,
    pub local: LocalCoord,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiverSet {
    receivers: Vec<Receiver>,
    owned: Vec<OwnedReceiver>,
}

impl ReceiverSet {
    /// Resolve ownership of every receiver against `partition`.
    ///
    /// # Errors
    /// `ReceiverOutsideGrid` if a coordinate lies outside the global grid;
    /// such a receiver would have no owner and its trace would silently stay
    /// zero.
    pub fn new(partition: &GridPartition, coords: &[GlobalCoord]) -> Result<Self, GridError> {
        let decomp = partition.decomposition();
        let mut receivers = Vec::with_capacity(coords.len());
        let mut owned = Vec::new();
        for (i, &global) in coords.iter().enumerate() {
            if !decomp.contains(global) {
                return Err(GridError::ReceiverOutsideGrid {
                    index: i + 1,
                    coord: global.0,
                });
            }
            let local = partition.owns(global);
            if let Some(local) = local {
                owned.push(OwnedReceiver {
                    local_trace: owned.len() + 1,
                    global_trace: i + 1,
                    local,
                });
            }
            receivers.push(Receiver { global, local });
        }
        log::debug!(
            "rank {}: owns {} of {} receivers",
            partition.rank(),
            owned.len(),
            receivers.len()
        );
        let set = Self { receivers, owned };
        crate::debug_invariants!(set.validate_invariants(), "ReceiverSet");
        Ok(set)
    }

    /// Total number of receivers (`ntr_glob`).
    pub fn ntr_glob(&self) -> usize {
        self.receivers.len()
    }

    /// Number of receivers owned by this rank.
    pub fn ntr_local(&self) -> usize {
        self.owned.len()
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// Owned receivers in compacted (ascending global) order.
    pub fn owned(&self) -> &[OwnedReceiver] {
        &self.owned
    }

    /// `flags[i]` is true iff this rank owns global receiver `i + 1`.
    pub fn ownership_flags(&self) -> Vec<bool> {
        self.receivers.iter().map(|r| r.local.is_some()).collect()
    }
}

impl DebugInvariants for ReceiverSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ReceiverSet");
    }

    fn validate_invariants(&self) -> Result<(), GridError> {
        let flagged = self.receivers.iter().filter(|r| r.local.is_some()).count();
        ensure(flagged == self.owned.len(), || {
            format!("{flagged} flagged receivers but {} compacted", self.owned.len())
        })?;
        for (k, o) in self.owned.iter().enumerate() {
            ensure(o.local_trace == k + 1, || {
                format!("owned receiver {k} has local trace {}", o.local_trace)
            })?;
            ensure(
                self.receivers
                    .get(o.global_trace - 1)
                    .is_some_and(|r| r.local == Some(o.local)),
                || format!("local trace {} points at a foreign receiver", o.local_trace),
            )?;
        }
        ensure(
            self.owned.windows(2).all(|w| w[0].global_trace < w[1].global_trace),
            || "compacted receivers are not in ascending global order".into(),
        )
    }
}
