//! Simulation context: the run-wide parameters every component is built from.
//!
//! A [`SimulationContext`] is constructed once (usually from the JSON
//! parameter file) and handed to the partition, the receiver sampler and the
//! collector at construction. Nothing reads process-global state.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::data::bounds::Bounds;
use crate::grid_error::GridError;
use crate::topology::partition::GridDecomposition;

/// Which quantities are recorded at the receivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeismoMode {
    /// Particle velocities `vx`, `vy`, `vz`.
    Velocity,
    /// Isotropic pressure from the stress diagonal.
    Pressure,
    /// Divergence and curl of the velocity field.
    DivCurl,
    /// Everything above.
    All,
}

impl SeismoMode {
    /// Map the integer `SEISMO` switch of classic parameter files (1..=4).
    pub fn from_code(code: i64) -> Result<Self, GridError> {
        match code {
            1 => Ok(Self::Velocity),
            2 => Ok(Self::Pressure),
            3 => Ok(Self::DivCurl),
            4 => Ok(Self::All),
            other => Err(GridError::Config(format!(
                "SEISMO must be in 1..=4, got {other}"
            ))),
        }
    }

    pub fn records_velocity(self) -> bool {
        matches!(self, Self::Velocity | Self::All)
    }

    pub fn records_pressure(self) -> bool {
        matches!(self, Self::Pressure | Self::All)
    }

    pub fn records_div_curl(self) -> bool {
        matches!(self, Self::DivCurl | Self::All)
    }
}

fn default_ndt() -> usize {
    1
}

fn default_halo() -> usize {
    1
}

/// Run-wide parameters shared by all ranks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationContext {
    /// Global grid points `[NXG, NYG, NZG]`.
    pub global_extent: [usize; 3],
    /// Process grid `[NPROCX, NPROCY, NPROCZ]`.
    pub procs: [usize; 3],
    /// Grid spacing `[DX, DY, DZ]` in metres.
    pub spacing: [f32; 3],
    /// Number of time steps.
    pub nt: usize,
    /// Seismogram sampling interval in time steps.
    #[serde(default = "default_ndt")]
    pub ndt: usize,
    pub seismo: SeismoMode,
    /// Halo width around each owned sub-block.
    #[serde(default = "default_halo")]
    pub halo: usize,
}

impl SimulationContext {
    /// Parse and validate a JSON parameter document.
    pub fn from_json_str(s: &str) -> Result<Self, GridError> {
        let ctx: Self = serde_json::from_str(s).map_err(|e| GridError::Config(e.to_string()))?;
        ctx.validate()?;
        Ok(ctx)
    }

    /// Parse and validate a JSON parameter document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GridError> {
        let ctx: Self =
            serde_json::from_reader(reader).map_err(|e| GridError::Config(e.to_string()))?;
        ctx.validate()?;
        Ok(ctx)
    }

    /// Check parameter consistency.
    ///
    /// # Errors
    /// - `Config` for non-positive spacing, `nt == 0`, `ndt == 0`, or a
    ///   zero halo when derivatives are recorded.
    /// - `InvalidDecomposition` if the process grid does not tile the
    ///   global grid.
    pub fn validate(&self) -> Result<(), GridError> {
        if let Some(axis) = self.spacing.iter().position(|&h| !(h > 0.0)) {
            return Err(GridError::Config(format!(
                "grid spacing on axis {axis} must be positive, got {}",
                self.spacing[axis]
            )));
        }
        if self.nt == 0 {
            return Err(GridError::Config("nt must be positive".into()));
        }
        if self.ndt == 0 {
            return Err(GridError::Config("ndt must be positive".into()));
        }
        if self.seismo.records_div_curl() && self.halo == 0 {
            return Err(GridError::Config(
                "divergence/curl stencils need a halo of at least one point".into(),
            ));
        }
        if self.nt % self.ndt != 0 {
            log::warn!(
                "nt={} is not a multiple of ndt={}; the last {} steps are not recorded",
                self.nt,
                self.ndt,
                self.nt % self.ndt
            );
        }
        self.decomposition().map(|_| ())
    }

    pub fn decomposition(&self) -> Result<GridDecomposition, GridError> {
        GridDecomposition::new(self.global_extent, self.procs)
    }

    /// Number of participating ranks.
    pub fn world_size(&self) -> usize {
        self.procs.iter().product()
    }

    /// Number of seismogram samples per trace.
    pub fn ns(&self) -> usize {
        self.nt / self.ndt
    }

    /// Seismogram column (1-based) recorded at time step `step` (1-based),
    /// or `None` if the step is not on the sampling cadence.
    pub fn sample_index(&self, step: usize) -> Option<usize> {
        (step > 0 && step <= self.nt && step % self.ndt == 0).then(|| step / self.ndt)
    }

    /// Bounds of a local field array: the owned block plus the halo.
    pub fn field_bounds(&self) -> Result<Bounds<3>, GridError> {
        let local = self.decomposition()?.local_extent();
        let h = self.halo as isize;
        Bounds::new(
            [1 - h; 3],
            std::array::from_fn(|a| local[a] as isize + h),
        )
    }
}
