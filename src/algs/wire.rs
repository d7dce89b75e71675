//! Element types that may cross rank boundaries, and byte casts for the
//! in-process backend.

use std::ops::AddAssign;

use bytemuck::Pod;
use num_traits::Zero;

/// A plain numeric element that can be summed across ranks.
#[cfg(not(feature = "mpi-support"))]
pub trait WireScalar: Pod + Zero + AddAssign + Send + Sync + 'static {}

/// A plain numeric element that can be summed across ranks.
#[cfg(feature = "mpi-support")]
pub trait WireScalar:
    Pod + Zero + AddAssign + Send + Sync + 'static + mpi::traits::Equivalence
{
}

impl WireScalar for f32 {}
impl WireScalar for f64 {}
impl WireScalar for i32 {}
impl WireScalar for i64 {}

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Reinterpret received bytes as elements.
///
/// Copies, since a `Bytes` payload carries no alignment guarantee for `T`.
pub fn collect_from_bytes<T: Pod>(bytes: &[u8]) -> Vec<T> {
    let n = bytes.len() / std::mem::size_of::<T>();
    let mut out = vec![T::zeroed(); n];
    let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut out);
    let len = dst.len();
    dst.copy_from_slice(&bytes[..len]);
    out
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}
