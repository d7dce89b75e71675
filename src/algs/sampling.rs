//! Receiver sampling: extract recorded quantities from the local wavefield.
//!
//! At every recorded time step the sampler visits the receivers this rank
//! owns, in compacted order, and writes one value per quantity into column
//! `time_index` of that receiver's local trace.
//!
//! Quantities at local point `(i, j, k)` with `h = (dx, dy, dz)`:
//!
//! - velocity: `vx, vy, vz` read at the point;
//! - pressure: `-(sxx + syy + szz) / 3`;
//! - divergence: `(∂x vx + ∂y vy + ∂z vz) * sqrt(pi)` with backward
//!   differences `(v(i) - v(i-1)) / h`;
//! - curl: with forward differences `∂a vb = (vb(a+1) - vb(a)) / h_a`,
//!   `A = u * Σ d|d|` over `d ∈ {∂z vy - ∂y vz, ∂x vz - ∂z vx, ∂y vx - ∂x vy}`
//!   and the recorded value is [`signed_sqrt`]`(A)`.
//!
//! The difference stencils read one point beyond the receiver on each side,
//! so the arrays must carry a populated halo of at least one point.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::SeismoMode;
use crate::data::arena::Array3;
use crate::data::receivers::{OwnedReceiver, ReceiverSet};
use crate::data::seismogram::{Quantity, SeismogramSet};
use crate::data::wavefield::LocalState;
use crate::grid_error::GridError;
use crate::topology::partition::LocalCoord;

/// `sign(x) * sqrt(|x|)`; zero maps to zero.
#[inline]
pub fn signed_sqrt(x: f32) -> f32 {
    if x == 0.0 {
        0.0
    } else {
        x.signum() * x.abs().sqrt()
    }
}

/// Values read at one receiver for one time step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Probe {
    pub velocity: Option<[f32; 3]>,
    pub pressure: Option<f32>,
    pub divergence: Option<f32>,
    pub curl: Option<f32>,
}

impl Probe {
    pub fn get(&self, q: Quantity) -> Option<f32> {
        match q {
            Quantity::Vx => self.velocity.map(|v| v[0]),
            Quantity::Vy => self.velocity.map(|v| v[1]),
            Quantity::Vz => self.velocity.map(|v| v[2]),
            Quantity::Pressure => self.pressure,
            Quantity::Divergence => self.divergence,
            Quantity::Curl => self.curl,
        }
    }
}

/// Fields of `state` that `mode` reads, checked up front.
struct Fields<'a> {
    vx: &'a Array3<f32>,
    vy: &'a Array3<f32>,
    vz: &'a Array3<f32>,
    stress: Option<[&'a Array3<f32>; 3]>,
    pi: Option<&'a Array3<f32>>,
    u: Option<&'a Array3<f32>>,
}

impl<'a> Fields<'a> {
    fn resolve(state: &LocalState<'a>, mode: SeismoMode) -> Result<Self, GridError> {
        let stress = if mode.records_pressure() {
            let s = state.stress.ok_or(GridError::MissingField("stress"))?;
            Some([&s.xx, &s.yy, &s.zz])
        } else {
            None
        };
        let (pi, u) = if mode.records_div_curl() {
            (
                Some(state.pi.ok_or(GridError::MissingField("pi"))?),
                Some(state.u.ok_or(GridError::MissingField("u"))?),
            )
        } else {
            (None, None)
        };
        Ok(Self {
            vx: &state.velocity.x,
            vy: &state.velocity.y,
            vz: &state.velocity.z,
            stress,
            pi,
            u,
        })
    }

    fn probe(&self, at: LocalCoord, mode: SeismoMode, inv_h: [f32; 3]) -> Probe {
        let p = at.0;
        let [i, j, k] = p;
        let mut out = Probe::default();

        if mode.records_velocity() {
            out.velocity = Some([self.vx[p], self.vy[p], self.vz[p]]);
        }
        if let Some([sxx, syy, szz]) = self.stress {
            out.pressure = Some(-(sxx[p] + syy[p] + szz[p]) / 3.0);
        }
        if let (Some(pi), Some(u)) = (self.pi, self.u) {
            let [dhx, dhy, dhz] = inv_h;
            let (vx, vy, vz) = (self.vx, self.vy, self.vz);

            let vxy = (vx[[i, j + 1, k]] - vx[p]) * dhy;
            let vxz = (vx[[i, j, k + 1]] - vx[p]) * dhz;
            let vyx = (vy[[i + 1, j, k]] - vy[p]) * dhx;
            let vyz = (vy[[i, j, k + 1]] - vy[p]) * dhz;
            let vzx = (vz[[i + 1, j, k]] - vz[p]) * dhx;
            let vzy = (vz[[i, j + 1, k]] - vz[p]) * dhy;

            let amp = u[p]
                * ((vyz - vzy) * (vyz - vzy).abs()
                    + (vzx - vxz) * (vzx - vxz).abs()
                    + (vxy - vyx) * (vxy - vyx).abs());
            out.curl = Some(signed_sqrt(amp));

            let vxx = (vx[p] - vx[[i - 1, j, k]]) * dhx;
            let vyy = (vy[p] - vy[[i, j - 1, k]]) * dhy;
            let vzz = (vz[p] - vz[[i, j, k - 1]]) * dhz;
            out.divergence = Some((vxx + vyy + vzz) * pi[p].sqrt());
        }
        out
    }
}

/// Records the owned receivers' traces for one rank.
#[derive(Clone, Debug)]
pub struct ReceiverSampler {
    mode: SeismoMode,
    inv_spacing: [f32; 3],
    seismograms: SeismogramSet,
}

impl ReceiverSampler {
    /// Allocate local seismograms of `ntr_local × ns` for every quantity of
    /// `mode`.
    ///
    /// # Errors
    /// `Config` if a grid spacing is not positive and finite.
    pub fn new(
        mode: SeismoMode,
        spacing: [f32; 3],
        ntr_local: usize,
        ns: usize,
    ) -> Result<Self, GridError> {
        if let Some(axis) = spacing.iter().position(|&h| !(h > 0.0 && h.is_finite())) {
            return Err(GridError::Config(format!(
                "grid spacing on axis {axis} must be positive and finite, got {}",
                spacing[axis]
            )));
        }
        Ok(Self {
            mode,
            inv_spacing: spacing.map(|h| 1.0 / h),
            seismograms: SeismogramSet::new(mode, ntr_local, ns)?,
        })
    }

    pub fn mode(&self) -> SeismoMode {
        self.mode
    }

    /// Sample every owned receiver at `time_index` (1-based column).
    ///
    /// # Errors
    /// - `SampleOutOfRange` if `time_index` is outside `1..=ns`.
    /// - `ShapeMismatch` if `receivers` owns a different number of traces
    ///   than the sampler was built for.
    /// - `MissingField` if `state` lacks stress (pressure) or `pi`/`u`
    ///   (divergence/curl).
    pub fn sample(
        &mut self,
        time_index: usize,
        receivers: &ReceiverSet,
        state: &LocalState<'_>,
    ) -> Result<(), GridError> {
        let ns = self.seismograms.ns();
        if time_index == 0 || time_index > ns {
            return Err(GridError::SampleOutOfRange {
                index: time_index,
                ns,
            });
        }
        if receivers.ntr_local() != self.seismograms.ntr() {
            return Err(GridError::ShapeMismatch {
                expected: (self.seismograms.ntr(), ns),
                found: (receivers.ntr_local(), ns),
            });
        }
        let fields = Fields::resolve(state, self.mode)?;
        let probes = self.probe_all(&fields, receivers.owned());

        let col = time_index as isize;
        for &q in Quantity::for_mode(self.mode) {
            let Some(matrix) = self.seismograms.get_mut(q) else {
                continue;
            };
            for (owned, probe) in receivers.owned().iter().zip(&probes) {
                if let Some(v) = probe.get(q) {
                    matrix[[owned.local_trace as isize, col]] = v;
                }
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "rayon"))]
    fn probe_all(&self, fields: &Fields<'_>, owned: &[OwnedReceiver]) -> Vec<Probe> {
        owned
            .iter()
            .map(|o| fields.probe(o.local, self.mode, self.inv_spacing))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn probe_all(&self, fields: &Fields<'_>, owned: &[OwnedReceiver]) -> Vec<Probe> {
        owned
            .par_iter()
            .map(|o| fields.probe(o.local, self.mode, self.inv_spacing))
            .collect()
    }

    /// Local (compacted) seismograms recorded so far.
    pub fn seismograms(&self) -> &SeismogramSet {
        &self.seismograms
    }

    pub fn into_seismograms(self) -> SeismogramSet {
        self.seismograms
    }
}
