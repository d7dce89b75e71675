//! ArenaArray: one contiguous, zero-initialised buffer addressed by
//! arbitrary (possibly negative, non-zero-based) coordinates.
//!
//! All simulation state lives in these arrays: wavefields and material
//! parameters as 3-D arrays with halo bounds such as `[-1..=nx+2]`, and
//! seismograms as 2-D arrays `[1..=ntr][1..=ns]`.
//!
//! The addressing follows the classic offset-pointer layout: the row-major
//! strides and the contribution of the lower corner are folded into a single
//! `base` at construction, so an access is `base + Σ idx[a] * stride[a]` with
//! no per-axis lower-bound subtraction.
//!
//! # Access contract
//! - [`ArenaArray::get`] / [`ArenaArray::get_mut`] check bounds and return
//!   `Option`.
//! - `Index`/`IndexMut` check bounds with `debug_assert!` only. In release
//!   builds an out-of-bounds coordinate is a caller bug: it either panics on
//!   the backing slice or silently addresses a neighbouring element.
//! - [`ArenaArray::get_unchecked`] skips every check.

use std::fmt;
use std::ops::{Index, IndexMut, RangeInclusive};

use num_traits::Zero;
use static_assertions::assert_impl_all;

use crate::data::bounds::{Bounds, IndexIter};
use crate::debug_invariants::{ensure, DebugInvariants};
use crate::grid_error::GridError;

/// Contiguous N-dimensional array with inclusive per-axis bounds.
///
/// # Invariants
/// - `data.len()` equals the product of the axis extents.
/// - `offset(bounds.lower()) == 0` and `offset(bounds.upper()) == len - 1`
///   for a non-empty array.
/// - Every element is `T::zero()` right after [`ArenaArray::new`].
#[derive(Clone, PartialEq)]
pub struct ArenaArray<T, const N: usize> {
    data: Vec<T>,
    bounds: Bounds<N>,
    strides: [isize; N],
    base: isize,
}

/// 1-D array (`vector`, `ivector`, …).
pub type Array1<T> = ArenaArray<T, 1>;
/// 2-D array (`matrix`); seismograms use this shape.
pub type Array2<T> = ArenaArray<T, 2>;
/// 3-D array (`3-tensor`); wavefields and material parameters.
pub type Array3<T> = ArenaArray<T, 3>;
/// 4-D array (`4-tensor`).
pub type Array4<T> = ArenaArray<T, 4>;

assert_impl_all!(Array3<f32>: Send, Sync, Clone);
assert_impl_all!(Array2<f64>: Send, Sync, Clone);

impl<T, const N: usize> ArenaArray<T, N> {
    /// Name used in allocation diagnostics.
    const KIND: &'static str = match N {
        1 => "Array1::new",
        2 => "Array2::new",
        3 => "Array3::new",
        4 => "Array4::new",
        _ => "ArenaArray::new",
    };

    /// Allocate a zero-filled array over `bounds`.
    ///
    /// # Errors
    /// - `SizeOverflow` if the element count or the offset arithmetic does
    ///   not fit the address space.
    /// - `Allocation` if the backing buffer cannot be reserved. This is the
    ///   fatal resource-exhaustion case; callers in a distributed run hand it
    ///   to [`crate::driver::OrAbort`].
    pub fn new(bounds: Bounds<N>) -> Result<Self, GridError>
    where
        T: Zero + Clone,
    {
        let len = checked_len(&bounds)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| GridError::Allocation {
            what: Self::KIND,
            elements: len,
        })?;
        data.resize(len, T::zero());
        log::debug!("{}: allocated {len} elements over {bounds:?}", Self::KIND);
        Self::from_parts(data, bounds)
    }

    /// Allocate a zero-filled array from one inclusive range per axis.
    ///
    /// ```rust
    /// # fn main() -> Result<(), seismo_grid::grid_error::GridError> {
    /// use seismo_grid::data::arena::Array2;
    /// let mut m = Array2::<f32>::zeros([1..=3, -2..=2])?;
    /// m[[3, -2]] = 4.0;
    /// assert_eq!(m[[3, -2]], 4.0);
    /// assert_eq!(m[[1, 0]], 0.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn zeros(ranges: [RangeInclusive<isize>; N]) -> Result<Self, GridError>
    where
        T: Zero + Clone,
    {
        Self::new(Bounds::from_ranges(ranges)?)
    }

    /// Wrap an existing buffer laid out in storage order.
    ///
    /// # Errors
    /// `LengthMismatch` if `data.len()` differs from the element count of
    /// `bounds`.
    pub fn from_shape_vec(bounds: Bounds<N>, data: Vec<T>) -> Result<Self, GridError> {
        let len = checked_len(&bounds)?;
        if data.len() != len {
            return Err(GridError::LengthMismatch {
                expected: len,
                found: data.len(),
            });
        }
        Self::from_parts(data, bounds)
    }

    fn from_parts(data: Vec<T>, bounds: Bounds<N>) -> Result<Self, GridError> {
        let extents = bounds.extents();
        let overflow = || GridError::SizeOverflow(extents.to_vec());
        let mut strides = [0isize; N];
        let mut stride = 1isize;
        for axis in (0..N).rev() {
            strides[axis] = stride;
            let extent = isize::try_from(extents[axis]).map_err(|_| overflow())?;
            stride = stride.checked_mul(extent.max(1)).ok_or_else(overflow)?;
        }
        let mut base = 0isize;
        for axis in 0..N {
            let shift = bounds.lower()[axis]
                .checked_mul(strides[axis])
                .ok_or_else(overflow)?;
            base = base.checked_sub(shift).ok_or_else(overflow)?;
        }
        // Partial sums of `offset` are monotone in every coordinate, so if
        // both corners evaluate without overflow every in-bounds index does.
        if !bounds.is_empty() {
            for corner in [bounds.lower(), bounds.upper()] {
                checked_offset(base, &strides, &corner).ok_or_else(overflow)?;
            }
        }
        let array = Self {
            data,
            bounds,
            strides,
            base,
        };
        crate::debug_invariants!(array.validate_invariants(), "ArenaArray layout");
        Ok(array)
    }

    /// Release the array. `bounds` must equal the creation bounds.
    ///
    /// Memory is returned in one step; there is no partial destruction.
    /// Mismatched bounds are a contract violation, caught by a debug
    /// assertion and otherwise ignored.
    pub fn destroy(self, bounds: &Bounds<N>) {
        debug_assert_eq!(
            &self.bounds, bounds,
            "destroy bounds must match creation bounds"
        );
        log::debug!("{}: released {} elements", Self::KIND, self.data.len());
        drop(self);
    }

    #[inline]
    pub fn bounds(&self) -> &Bounds<N> {
        &self.bounds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    fn offset(&self, idx: &[isize; N]) -> isize {
        let mut off = self.base;
        for axis in 0..N {
            off += idx[axis] * self.strides[axis];
        }
        off
    }

    /// Bounds-checked shared access.
    #[inline]
    pub fn get(&self, idx: [isize; N]) -> Option<&T> {
        if !self.bounds.contains(&idx) {
            return None;
        }
        self.data.get(self.offset(&idx) as usize)
    }

    /// Bounds-checked mutable access.
    #[inline]
    pub fn get_mut(&mut self, idx: [isize; N]) -> Option<&mut T> {
        if !self.bounds.contains(&idx) {
            return None;
        }
        let off = self.offset(&idx) as usize;
        self.data.get_mut(off)
    }

    /// Unchecked shared access for inner loops.
    ///
    /// # Safety
    /// `idx` must lie within [`Self::bounds`].
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, idx: [isize; N]) -> &T {
        debug_assert!(self.bounds.contains(&idx));
        let off = self.offset(&idx) as usize;
        // SAFETY: caller guarantees idx is in bounds, so off < data.len().
        unsafe { self.data.get_unchecked(off) }
    }

    /// Unchecked mutable access for inner loops.
    ///
    /// # Safety
    /// `idx` must lie within [`Self::bounds`].
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, idx: [isize; N]) -> &mut T {
        debug_assert!(self.bounds.contains(&idx));
        let off = self.offset(&idx) as usize;
        // SAFETY: caller guarantees idx is in bounds, so off < data.len().
        unsafe { self.data.get_unchecked_mut(off) }
    }

    /// The whole backing buffer in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    /// Every coordinate in storage order.
    pub fn indices(&self) -> IndexIter<N> {
        self.bounds.indices()
    }

    /// `(coordinate, value)` pairs in storage order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = ([isize; N], &T)> + '_ {
        self.bounds.indices().zip(self.data.iter())
    }

    /// Largest absolute value, or `0.0` for an empty array.
    pub fn abs_max(&self) -> f64
    where
        T: Copy + Into<f64>,
    {
        self.data
            .iter()
            .map(|&v| {
                let x: f64 = v.into();
                x.abs()
            })
            .fold(0.0, f64::max)
    }
}

impl<T> ArenaArray<T, 2> {
    /// Number of rows (first axis).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.bounds.extent(0)
    }

    /// Number of columns (second axis).
    #[inline]
    pub fn ncols(&self) -> usize {
        self.bounds.extent(1)
    }

    /// Contiguous slice of row `r`.
    ///
    /// # Panics
    /// If `r` is outside the row bounds.
    pub fn row(&self, r: isize) -> &[T] {
        let (start, end) = self.row_span(r);
        &self.data[start..end]
    }

    /// Mutable contiguous slice of row `r`.
    ///
    /// # Panics
    /// If `r` is outside the row bounds.
    pub fn row_mut(&mut self, r: isize) -> &mut [T] {
        let (start, end) = self.row_span(r);
        &mut self.data[start..end]
    }

    fn row_span(&self, r: isize) -> (usize, usize) {
        let [lo, _] = self.bounds.lower();
        let [hi, _] = self.bounds.upper();
        assert!(lo <= r && r <= hi, "row {r} outside {lo}..={hi}");
        let ncols = self.ncols();
        let start = (r - lo) as usize * ncols;
        (start, start + ncols)
    }
}

impl<T, const N: usize> Index<[isize; N]> for ArenaArray<T, N> {
    type Output = T;

    #[inline(always)]
    fn index(&self, idx: [isize; N]) -> &T {
        debug_assert!(
            self.bounds.contains(&idx),
            "index {idx:?} outside {:?}",
            self.bounds
        );
        &self.data[self.offset(&idx) as usize]
    }
}

impl<T, const N: usize> IndexMut<[isize; N]> for ArenaArray<T, N> {
    #[inline(always)]
    fn index_mut(&mut self, idx: [isize; N]) -> &mut T {
        debug_assert!(
            self.bounds.contains(&idx),
            "index {idx:?} outside {:?}",
            self.bounds
        );
        let off = self.offset(&idx) as usize;
        &mut self.data[off]
    }
}

impl<T, const N: usize> fmt::Debug for ArenaArray<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaArray")
            .field("lower", &self.bounds.lower())
            .field("upper", &self.bounds.upper())
            .field("len", &self.data.len())
            .finish()
    }
}

impl<T, const N: usize> DebugInvariants for ArenaArray<T, N> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ArenaArray");
    }

    fn validate_invariants(&self) -> Result<(), GridError> {
        let expected = checked_len(&self.bounds)?;
        ensure(self.data.len() == expected, || {
            format!(
                "backing length {} != product of extents {expected}",
                self.data.len()
            )
        })?;
        if !self.bounds.is_empty() {
            ensure(self.offset(&self.bounds.lower()) == 0, || {
                "lower corner does not address element 0".into()
            })?;
            ensure(
                self.offset(&self.bounds.upper()) == expected as isize - 1,
                || "upper corner does not address the last element".into(),
            )?;
        }
        Ok(())
    }
}

fn checked_offset<const N: usize>(
    base: isize,
    strides: &[isize; N],
    idx: &[isize; N],
) -> Option<isize> {
    (0..N).try_fold(base, |off, axis| {
        off.checked_add(idx[axis].checked_mul(strides[axis])?)
    })
}

fn checked_len<const N: usize>(bounds: &Bounds<N>) -> Result<usize, GridError> {
    bounds
        .checked_len()
        .ok_or_else(|| GridError::SizeOverflow(bounds.extents().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_initialised_with_negative_lower_bounds() {
        let t = Array3::<f32>::zeros([-1..=2, 0..=3, 1..=2]).unwrap();
        assert_eq!(t.len(), 4 * 4 * 2);
        for idx in t.indices() {
            assert_eq!(t[idx], 0.0);
        }
    }

    #[test]
    fn writes_land_on_distinct_cells() {
        let mut t = Array3::<i32>::zeros([-1..=1, -1..=1, -1..=1]).unwrap();
        for (n, idx) in t.indices().collect::<Vec<_>>().into_iter().enumerate() {
            t[idx] = n as i32;
        }
        assert_eq!(t.as_slice(), (0..27).collect::<Vec<_>>().as_slice());
        assert_eq!(t[[-1, -1, -1]], 0);
        assert_eq!(t[[1, 1, 1]], 26);
        assert_eq!(t[[0, 0, 0]], 13);
    }

    #[test]
    fn overflowing_bounds_are_errors_not_panics() {
        assert!(matches!(
            Array1::<u8>::zeros([0..=isize::MAX]),
            Err(GridError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Array1::<u8>::zeros([isize::MIN..=isize::MAX]),
            Err(GridError::InvalidBounds { .. })
        ));
        // small extents, but the folded base offset cannot be represented
        assert!(matches!(
            Array2::<u8>::zeros([isize::MAX - 1..=isize::MAX, 0..=1]),
            Err(GridError::SizeOverflow(_))
        ));
        assert!(matches!(
            Array2::<u8>::zeros([isize::MIN..=isize::MIN + 1, 0..=1]),
            Err(GridError::SizeOverflow(_))
        ));
    }

    #[test]
    fn checked_access_rejects_outside_coordinates() {
        let mut v = Array1::<f64>::zeros([1..=5]).unwrap();
        assert!(v.get([0]).is_none());
        assert!(v.get([6]).is_none());
        *v.get_mut([5]).unwrap() = 2.5;
        assert_eq!(v.get([5]), Some(&2.5));
    }

    #[test]
    fn unchecked_access_matches_checked() {
        let mut m = Array2::<f32>::zeros([1..=2, 1..=3]).unwrap();
        m[[2, 3]] = 7.0;
        // SAFETY: [2, 3] is inside the declared bounds.
        assert_eq!(unsafe { *m.get_unchecked([2, 3]) }, 7.0);
        unsafe { *m.get_unchecked_mut([1, 1]) = -1.0 };
        assert_eq!(m[[1, 1]], -1.0);
    }

    #[test]
    fn rows_are_contiguous() {
        let mut m = Array2::<f32>::zeros([1..=3, 1..=2]).unwrap();
        m.row_mut(2).copy_from_slice(&[5.0, 6.0]);
        assert_eq!(m[[2, 1]], 5.0);
        assert_eq!(m[[2, 2]], 6.0);
        assert_eq!(m.row(3), &[0.0, 0.0]);
        assert_eq!((m.nrows(), m.ncols()), (3, 2));
    }

    #[test]
    fn four_dimensional_layout() {
        let mut t = Array4::<f32>::zeros([0..=1, 1..=2, -3..=-2, 5..=7]).unwrap();
        t[[1, 2, -2, 7]] = 1.0;
        assert_eq!(*t.as_slice().last().unwrap(), 1.0);
        t.validate_invariants().unwrap();
    }

    #[test]
    fn empty_rows_allocate_nothing() {
        let m = Array2::<f32>::zeros([1..=0, 1..=10]).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.nrows(), 0);
        m.validate_invariants().unwrap();
    }

    #[test]
    fn from_shape_vec_checks_length() {
        let b = Bounds::from_ranges([1..=2, 1..=2]).unwrap();
        let err = Array2::from_shape_vec(b, vec![1.0f32; 3]).unwrap_err();
        assert_eq!(
            err,
            GridError::LengthMismatch {
                expected: 4,
                found: 3
            }
        );
        let m = Array2::from_shape_vec(b, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m[[2, 1]], 3.0);
    }

    #[test]
    fn abs_max_finds_largest_magnitude() {
        let mut m = Array2::<f32>::zeros([1..=2, 1..=2]).unwrap();
        m[[1, 2]] = -9.0;
        m[[2, 1]] = 4.0;
        assert_eq!(m.abs_max(), 9.0);
    }

    #[test]
    fn destroy_with_creation_bounds() {
        let b = Bounds::from_ranges([-2..=2]).unwrap();
        let v = Array1::<u8>::new(b).unwrap();
        v.destroy(&b);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "destroy bounds must match creation bounds")]
    fn destroy_with_other_bounds_is_caught_in_debug() {
        let v = Array1::<u8>::zeros([-2..=2]).unwrap();
        v.destroy(&Bounds::from_ranges([1..=5]).unwrap());
    }

    #[test]
    fn huge_request_reports_allocation_or_overflow() {
        let err = Array3::<f64>::zeros([0..=isize::MAX / 4, 0..=3, 0..=3]).unwrap_err();
        assert!(matches!(
            err,
            GridError::SizeOverflow(_) | GridError::Allocation { .. }
        ));
    }
}
