//! Cartesian domain decomposition of the global grid.
//!
//! The global grid `[1..=NXG] × [1..=NYG] × [1..=NZG]` is cut into a
//! `NPROCX × NPROCY × NPROCZ` arrangement of equal, non-overlapping blocks of
//! `NX × NY × NZ` points. Rank `r` sits at rank coordinate
//! `pos = (r % NPROCX, (r / NPROCX) % NPROCY, r / (NPROCX * NPROCY))` and owns
//! the global points `pos * n + 1 ..= pos * n + n` on each axis.
//!
//! Because every extent is an exact multiple of its process count (checked
//! once in [`GridDecomposition::new`]), each global point has exactly one
//! owner, and `global = local + pos * n` inverts the local coordinate.

use serde::{Deserialize, Serialize};

use crate::data::bounds::Bounds;
use crate::debug_invariants::{ensure, DebugInvariants};
use crate::grid_error::GridError;

/// 1-based coordinate in the global grid, ordered `[x, y, z]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalCoord(pub [isize; 3]);

/// Coordinate in a rank's local arrays; the owned block is `[1..=n]` per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalCoord(pub [isize; 3]);

/// The static process grid over the global grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDecomposition {
    global: [usize; 3],
    procs: [usize; 3],
    local: [usize; 3],
}

impl GridDecomposition {
    /// Build a decomposition of `global` points over `procs` processes.
    ///
    /// # Errors
    /// `InvalidDecomposition` if an axis has zero points or processes, or
    /// the global extent is not a multiple of the process count.
    pub fn new(global: [usize; 3], procs: [usize; 3]) -> Result<Self, GridError> {
        for axis in 0..3 {
            if procs[axis] == 0 || global[axis] == 0 || global[axis] % procs[axis] != 0 {
                return Err(GridError::InvalidDecomposition {
                    axis,
                    global: global[axis],
                    procs: procs[axis],
                });
            }
        }
        let local = std::array::from_fn(|a| global[a] / procs[a]);
        let decomp = Self {
            global,
            procs,
            local,
        };
        log::debug!(
            "decomposition: global {global:?} over {procs:?} processes, {local:?} points each"
        );
        crate::debug_invariants!(decomp.validate_invariants(), "GridDecomposition");
        Ok(decomp)
    }

    pub fn global_extent(&self) -> [usize; 3] {
        self.global
    }

    pub fn procs(&self) -> [usize; 3] {
        self.procs
    }

    /// Points per rank on each axis, `[NX, NY, NZ]`.
    pub fn local_extent(&self) -> [usize; 3] {
        self.local
    }

    /// Number of ranks in the process grid.
    pub fn size(&self) -> usize {
        self.procs.iter().product()
    }

    /// Rank coordinate of `rank`.
    pub fn rank_coord(&self, rank: usize) -> Result<[usize; 3], GridError> {
        if rank >= self.size() {
            return Err(GridError::RankOutOfRange {
                rank,
                size: self.size(),
            });
        }
        let [px, py, _] = self.procs;
        Ok([rank % px, (rank / px) % py, rank / (px * py)])
    }

    /// Inverse of [`Self::rank_coord`].
    pub fn rank_of(&self, pos: [usize; 3]) -> usize {
        let [px, py, _] = self.procs;
        pos[0] + px * (pos[1] + py * pos[2])
    }

    /// Whether `g` lies in the global grid.
    pub fn contains(&self, g: GlobalCoord) -> bool {
        (0..3).all(|a| g.0[a] >= 1 && g.0[a] <= self.global[a] as isize)
    }

    /// The unique rank owning `g`, or `None` outside the global grid.
    pub fn owner_of(&self, g: GlobalCoord) -> Option<usize> {
        if !self.contains(g) {
            return None;
        }
        let pos = std::array::from_fn(|a| ((g.0[a] - 1) / self.local[a] as isize) as usize);
        Some(self.rank_of(pos))
    }

    /// The partition seen by `rank`.
    pub fn partition(&self, rank: usize) -> Result<GridPartition, GridError> {
        let pos = self.rank_coord(rank)?;
        Ok(GridPartition {
            decomp: *self,
            rank,
            pos,
        })
    }

    /// Exhaustively check that every global point is owned by exactly one
    /// rank and that its local coordinate maps back to it.
    ///
    /// Costs `O(points × ranks)`; meant for tests and small set-ups.
    pub fn verify_tiling(&self) -> Result<(), GridError> {
        let parts = (0..self.size())
            .map(|r| self.partition(r))
            .collect::<Result<Vec<_>, _>>()?;
        let [nx, ny, nz] = self.global.map(|n| n as isize);
        let points = itertools::iproduct!(1..=nx, 1..=ny, 1..=nz);
        for g in points.map(|(x, y, z)| GlobalCoord([x, y, z])) {
            let mut owners = parts.iter().filter_map(|p| p.owns(g).map(|l| (p, l)));
            let (part, local) = owners.next().ok_or_else(|| {
                GridError::Invariant(format!("global point {:?} has no owner", g.0))
            })?;
            ensure(owners.next().is_none(), || {
                format!("global point {:?} has more than one owner", g.0)
            })?;
            ensure(part.to_global(local) == g, || {
                format!(
                    "local {:?} on rank {} does not map back to {:?}",
                    local.0, part.rank, g.0
                )
            })?;
        }
        Ok(())
    }
}

impl DebugInvariants for GridDecomposition {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "GridDecomposition");
    }

    fn validate_invariants(&self) -> Result<(), GridError> {
        for a in 0..3 {
            ensure(self.local[a] > 0, || format!("axis {a} has empty blocks"))?;
            ensure(self.local[a] * self.procs[a] == self.global[a], || {
                format!(
                    "axis {a}: {} blocks of {} do not tile {} points",
                    self.procs[a], self.local[a], self.global[a]
                )
            })?;
        }
        Ok(())
    }
}

/// One rank's view of the decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPartition {
    decomp: GridDecomposition,
    rank: usize,
    pos: [usize; 3],
}

impl GridPartition {
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Rank coordinate `[POS_X, POS_Y, POS_Z]`.
    pub fn pos(&self) -> [usize; 3] {
        self.pos
    }

    pub fn decomposition(&self) -> &GridDecomposition {
        &self.decomp
    }

    pub fn local_extent(&self) -> [usize; 3] {
        self.decomp.local
    }

    /// Whether this rank owns `g`, and if so the local coordinate of `g`.
    ///
    /// Pure in the rank coordinate and extents. Points outside the global
    /// grid are owned by nobody.
    #[inline]
    pub fn owns(&self, g: GlobalCoord) -> Option<LocalCoord> {
        if !self.decomp.contains(g) {
            return None;
        }
        let mut local = [0isize; 3];
        for a in 0..3 {
            let n = self.decomp.local[a] as isize;
            if (g.0[a] - 1) / n != self.pos[a] as isize {
                return None;
            }
            local[a] = g.0[a] - self.pos[a] as isize * n;
        }
        Some(LocalCoord(local))
    }

    /// `global = local + pos * n`.
    #[inline]
    pub fn to_global(&self, l: LocalCoord) -> GlobalCoord {
        GlobalCoord(std::array::from_fn(|a| {
            l.0[a] + self.pos[a] as isize * self.decomp.local[a] as isize
        }))
    }

    /// Bounds of the owned block, `[1..=n]` per axis.
    pub fn owned_bounds(&self) -> Bounds<3> {
        self.field_bounds(0)
    }

    /// Bounds of a local field array with `halo` points on every side.
    pub fn field_bounds(&self, halo: usize) -> Bounds<3> {
        let h = halo as isize;
        let n = self.decomp.local;
        Bounds::new([1 - h; 3], std::array::from_fn(|a| n[a] as isize + h))
            .unwrap_or_else(|_| unreachable!("decomposition extents are positive"))
    }
}

impl DebugInvariants for GridPartition {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "GridPartition");
    }

    fn validate_invariants(&self) -> Result<(), GridError> {
        self.decomp.validate_invariants()?;
        ensure(self.decomp.rank_of(self.pos) == self.rank, || {
            format!("rank {} does not match its coordinate {:?}", self.rank, self.pos)
        })?;
        ensure((0..3).all(|a| self.pos[a] < self.decomp.procs[a]), || {
            format!("rank coordinate {:?} outside process grid", self.pos)
        })
    }
}
