//! Material model set-up with the ownership-check pattern.
//!
//! Every rank walks the whole global grid and evaluates the model at each
//! point, but only the owning rank stores the value, at its local
//! coordinate. Model definitions therefore stay written in global
//! coordinates and never need to know about the decomposition.

use itertools::iproduct;

use crate::data::arena::Array3;
use crate::grid_error::GridError;
use crate::topology::partition::{GlobalCoord, GridPartition};

/// Evaluate `f` at every global point and store the owned values into
/// `field`. Returns the number of points stored.
///
/// `field` must cover the owned block `[1..=n]` of `partition`.
pub fn fill_owned<F>(partition: &GridPartition, field: &mut Array3<f32>, mut f: F) -> usize
where
    F: FnMut(GlobalCoord) -> f32,
{
    debug_assert!(
        field.bounds().contains(&partition.owned_bounds().upper())
            && field.bounds().contains(&partition.owned_bounds().lower()),
        "field does not cover the owned block"
    );
    let [nx, ny, nz] = partition.decomposition().global_extent().map(|n| n as isize);
    let mut stored = 0;
    for (y, x, z) in iproduct!(1..=ny, 1..=nx, 1..=nz) {
        let g = GlobalCoord([x, y, z]);
        let value = f(g);
        if let Some(local) = partition.owns(g) {
            field[local.0] = value;
            stored += 1;
        }
    }
    stored
}

/// Density and elastic moduli of an isotropic model.
#[derive(Clone, Debug)]
pub struct ElasticModel {
    pub rho: Array3<f32>,
    /// `vp² ρ`, the bulk-modulus-related field read for divergence.
    pub pi: Array3<f32>,
    /// `vs² ρ`, the shear modulus read for curl.
    pub u: Array3<f32>,
}

impl ElasticModel {
    /// Homogeneous model with P velocity `vp`, S velocity `vs` (zero for an
    /// acoustic model) and density `rho`, on arrays with `halo` points.
    pub fn homogeneous(
        partition: &GridPartition,
        halo: usize,
        vp: f32,
        vs: f32,
        rho: f32,
    ) -> Result<Self, GridError> {
        let bounds = partition.field_bounds(halo);
        let mut model = Self {
            rho: Array3::new(bounds)?,
            pi: Array3::new(bounds)?,
            u: Array3::new(bounds)?,
        };
        fill_owned(partition, &mut model.rho, |_| rho);
        fill_owned(partition, &mut model.pi, |_| vp * vp * rho);
        let stored = fill_owned(partition, &mut model.u, |_| vs * vs * rho);
        log::debug!(
            "rank {}: homogeneous model vp={vp} vs={vs} rho={rho} on {stored} points",
            partition.rank()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::partition::GridDecomposition;

    #[test]
    fn each_point_is_stored_by_its_owner_only() {
        let d = GridDecomposition::new([4, 2, 6], [2, 1, 3]).unwrap();
        let mut total = 0;
        for r in 0..d.size() {
            let p = d.partition(r).unwrap();
            let mut field = Array3::<f32>::new(p.field_bounds(1)).unwrap();
            total += fill_owned(&p, &mut field, |g| (g.0[0] * 100 + g.0[1] * 10 + g.0[2]) as f32);
            for idx in p.owned_bounds().indices() {
                let g = p.to_global(crate::topology::partition::LocalCoord(idx));
                assert_eq!(field[idx], (g.0[0] * 100 + g.0[1] * 10 + g.0[2]) as f32);
            }
            // halo stays untouched
            assert_eq!(field[[0, 0, 0]], 0.0);
        }
        assert_eq!(total, 4 * 2 * 6);
    }

    #[test]
    fn homogeneous_moduli() {
        let d = GridDecomposition::new([2, 2, 2], [1, 1, 1]).unwrap();
        let m = ElasticModel::homogeneous(&d.partition(0).unwrap(), 1, 3500.0, 2000.0, 2000.0)
            .unwrap();
        assert_eq!(m.pi[[1, 2, 1]], 3500.0 * 3500.0 * 2000.0);
        assert_eq!(m.u[[2, 2, 2]], 2000.0 * 2000.0 * 2000.0);
        assert_eq!(m.rho[[0, 1, 1]], 0.0);
    }
}
