//! Seismogram matrices, one per recorded quantity.
//!
//! A matrix is an [`Array2`] declared `[1..=ntr][1..=ns]`: row = trace,
//! column = time sample. Locally the rows are compacted traces; after
//! collection they are global traces.

use std::collections::BTreeMap;

use crate::config::SeismoMode;
use crate::data::arena::Array2;
use crate::grid_error::GridError;

/// Trace-by-sample matrix of one quantity.
pub type SeismogramMatrix = Array2<f32>;

/// A physical quantity recorded at receivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    Vx,
    Vy,
    Vz,
    Pressure,
    Divergence,
    Curl,
}

impl Quantity {
    /// Quantities recorded for `mode`, in a fixed order.
    pub fn for_mode(mode: SeismoMode) -> &'static [Quantity] {
        use Quantity::*;
        match mode {
            SeismoMode::Velocity => &[Vx, Vy, Vz],
            SeismoMode::Pressure => &[Pressure],
            SeismoMode::DivCurl => &[Divergence, Curl],
            SeismoMode::All => &[Vx, Vy, Vz, Pressure, Divergence, Curl],
        }
    }

    /// Short name used for output files.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Vx => "vx",
            Quantity::Vy => "vy",
            Quantity::Vz => "vz",
            Quantity::Pressure => "p",
            Quantity::Divergence => "div",
            Quantity::Curl => "curl",
        }
    }
}

/// One matrix per recorded quantity, all of shape `ntr × ns`.
#[derive(Clone, Debug, PartialEq)]
pub struct SeismogramSet {
    ntr: usize,
    ns: usize,
    matrices: BTreeMap<Quantity, SeismogramMatrix>,
}

impl SeismogramSet {
    /// Allocate zeroed matrices for every quantity of `mode`.
    pub fn new(mode: SeismoMode, ntr: usize, ns: usize) -> Result<Self, GridError> {
        let mut matrices = BTreeMap::new();
        for &q in Quantity::for_mode(mode) {
            matrices.insert(q, Self::matrix(ntr, ns)?);
        }
        Ok(Self { ntr, ns, matrices })
    }

    /// Allocate a zeroed `[1..=ntr][1..=ns]` matrix.
    pub fn matrix(ntr: usize, ns: usize) -> Result<SeismogramMatrix, GridError> {
        SeismogramMatrix::zeros([1..=ntr as isize, 1..=ns as isize])
    }

    pub(crate) fn from_parts(
        ntr: usize,
        ns: usize,
        matrices: BTreeMap<Quantity, SeismogramMatrix>,
    ) -> Self {
        Self { ntr, ns, matrices }
    }

    pub fn ntr(&self) -> usize {
        self.ntr
    }

    pub fn ns(&self) -> usize {
        self.ns
    }

    pub fn get(&self, q: Quantity) -> Option<&SeismogramMatrix> {
        self.matrices.get(&q)
    }

    pub fn get_mut(&mut self, q: Quantity) -> Option<&mut SeismogramMatrix> {
        self.matrices.get_mut(&q)
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.matrices.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, &SeismogramMatrix)> {
        self.matrices.iter().map(|(&q, m)| (q, m))
    }
}
