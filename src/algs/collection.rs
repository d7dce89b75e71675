//! Seismogram collection: rebuild the global seismogram on every rank.
//!
//! Each rank holds its owned traces compacted into rows `1..=ntr_local`.
//! Collection scatters those rows back to their global positions in a
//! zero-filled `ntr_glob × ns` matrix and then sums that matrix across all
//! ranks. Since every receiver has exactly one owner, each global row gets
//! exactly one non-zero contribution and the sum *is* the gathered result.
//! No routing information ever crosses the wire.

use std::collections::BTreeMap;

use crate::algs::communicator::Communicator;
use crate::algs::wire::WireScalar;
use crate::data::arena::Array2;
use crate::data::receivers::ReceiverSet;
use crate::data::seismogram::SeismogramSet;
use crate::grid_error::GridError;

/// Place compacted local rows at their global row positions.
///
/// Walks global traces in order and advances the local row cursor only on
/// traces flagged as owned, undoing the sampler's compaction. Returns a
/// `[1..=flags.len()][1..=ns]` matrix that is zero on every foreign row.
///
/// # Errors
/// `ShapeMismatch` if `local` is not `count(flags) × ns`.
pub fn scatter_rows<T: WireScalar>(
    local: &Array2<T>,
    flags: &[bool],
    ns: usize,
) -> Result<Array2<T>, GridError> {
    let owned = flags.iter().filter(|&&f| f).count();
    if (local.nrows(), local.ncols()) != (owned, ns) {
        return Err(GridError::ShapeMismatch {
            expected: (owned, ns),
            found: (local.nrows(), local.ncols()),
        });
    }
    let mut global = Array2::<T>::zeros([1..=flags.len() as isize, 1..=ns as isize])?;
    let mut cursor = local.bounds().lower()[0];
    for (i, _) in flags.iter().enumerate().filter(|(_, f)| **f) {
        global
            .row_mut(i as isize + 1)
            .copy_from_slice(local.row(cursor));
        cursor += 1;
    }
    Ok(global)
}

/// Collect one quantity into the global `ntr_glob × ns` seismogram.
///
/// Collective: every rank must call it with the same `ntr_glob` and `ns`.
/// The argument checks run before any communication, so a rank that fails
/// them never enters the reduction; hand the error to
/// [`OrAbort`](crate::driver::OrAbort) so the others are not left waiting.
pub fn collect<T, C>(
    local: &Array2<T>,
    flags: &[bool],
    ntr_glob: usize,
    ns: usize,
    comm: &C,
) -> Result<Array2<T>, GridError>
where
    T: WireScalar,
    C: Communicator,
{
    if flags.len() != ntr_glob {
        return Err(GridError::ShapeMismatch {
            expected: (ntr_glob, ns),
            found: (flags.len(), ns),
        });
    }
    let mut global = scatter_rows(local, flags, ns)?;
    log::trace!(
        "rank {}: collecting {} local traces into {ntr_glob} x {ns}",
        comm.rank(),
        local.nrows()
    );
    comm.allreduce_sum(global.as_mut_slice());
    Ok(global)
}

/// Collects local seismograms for a fixed receiver table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeismogramCollector {
    flags: Vec<bool>,
    ns: usize,
}

impl SeismogramCollector {
    pub fn new(receivers: &ReceiverSet, ns: usize) -> Self {
        Self {
            flags: receivers.ownership_flags(),
            ns,
        }
    }

    /// Build from raw ownership flags (`flags.len() == ntr_glob`).
    pub fn from_flags(flags: Vec<bool>, ns: usize) -> Self {
        Self { flags, ns }
    }

    pub fn ntr_glob(&self) -> usize {
        self.flags.len()
    }

    pub fn ns(&self) -> usize {
        self.ns
    }

    /// Collect one matrix. See [`collect`].
    pub fn collect<T: WireScalar, C: Communicator>(
        &self,
        local: &Array2<T>,
        comm: &C,
    ) -> Result<Array2<T>, GridError> {
        collect(local, &self.flags, self.flags.len(), self.ns, comm)
    }

    /// Collect every quantity of `local`, in quantity order.
    ///
    /// All ranks must record the same quantities.
    pub fn collect_set<C: Communicator>(
        &self,
        local: &SeismogramSet,
        comm: &C,
    ) -> Result<SeismogramSet, GridError> {
        let mut out = BTreeMap::new();
        for (q, m) in local.iter() {
            out.insert(q, self.collect(m, comm)?);
        }
        Ok(SeismogramSet::from_parts(self.ntr_glob(), self.ns, out))
    }
}
