//! Per-rank wavefield and material arrays, and the read-only snapshot the
//! receiver sampler consumes.
//!
//! All arrays share the local field bounds (owned block plus halo) and are
//! indexed `[x, y, z]`. Halo values are filled by the time-stepping loop's
//! exchange before a snapshot is sampled.

use crate::data::arena::Array3;
use crate::data::bounds::Bounds;
use crate::grid_error::GridError;

/// Particle-velocity components.
#[derive(Clone, Debug)]
pub struct Velocity {
    pub x: Array3<f32>,
    pub y: Array3<f32>,
    pub z: Array3<f32>,
}

impl Velocity {
    pub fn zeros(bounds: Bounds<3>) -> Result<Self, GridError> {
        Ok(Self {
            x: Array3::new(bounds)?,
            y: Array3::new(bounds)?,
            z: Array3::new(bounds)?,
        })
    }
}

/// Normal components of the stress tensor.
#[derive(Clone, Debug)]
pub struct StressDiagonal {
    pub xx: Array3<f32>,
    pub yy: Array3<f32>,
    pub zz: Array3<f32>,
}

impl StressDiagonal {
    pub fn zeros(bounds: Bounds<3>) -> Result<Self, GridError> {
        Ok(Self {
            xx: Array3::new(bounds)?,
            yy: Array3::new(bounds)?,
            zz: Array3::new(bounds)?,
        })
    }
}

/// Borrowed view of everything the sampler may read at one time step.
///
/// `pi` is the bulk-modulus-related field (`vp² ρ`), `u` the shear-modulus
/// field (`vs² ρ`). Which parts must be present depends on the
/// [`SeismoMode`](crate::config::SeismoMode).
#[derive(Clone, Copy, Debug)]
pub struct LocalState<'a> {
    pub velocity: &'a Velocity,
    pub stress: Option<&'a StressDiagonal>,
    pub pi: Option<&'a Array3<f32>>,
    pub u: Option<&'a Array3<f32>>,
}

impl<'a> LocalState<'a> {
    pub fn new(velocity: &'a Velocity) -> Self {
        Self {
            velocity,
            stress: None,
            pi: None,
            u: None,
        }
    }

    pub fn with_stress(mut self, stress: &'a StressDiagonal) -> Self {
        self.stress = Some(stress);
        self
    }

    pub fn with_pi(mut self, pi: &'a Array3<f32>) -> Self {
        self.pi = Some(pi);
        self
    }

    pub fn with_u(mut self, u: &'a Array3<f32>) -> Self {
        self.u = Some(u);
        self
    }
}
