//! Inclusive per-axis bounds for [`ArenaArray`](crate::data::arena::ArenaArray).
//!
//! An axis declared `[lower..=upper]` has `upper - lower + 1` elements. An
//! empty axis is spelled `upper == lower - 1` (e.g. `1..=0`), which is how a
//! rank that owns no receivers declares its seismogram rows.

use std::ops::RangeInclusive;

use crate::grid_error::GridError;

/// Inclusive `[lower..=upper]` bounds for each of `N` axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds<const N: usize> {
    lower: [isize; N],
    upper: [isize; N],
}

impl<const N: usize> Bounds<N> {
    /// Build bounds from lower and upper corners.
    ///
    /// # Errors
    /// `InvalidBounds` if any axis has `upper < lower - 1`, or an extent
    /// `upper - lower + 1` that does not fit in `isize`.
    pub fn new(lower: [isize; N], upper: [isize; N]) -> Result<Self, GridError> {
        for axis in 0..N {
            let (lo, hi) = (lower[axis], upper[axis]);
            let extent = hi.checked_sub(lo).and_then(|d| d.checked_add(1));
            if !extent.is_some_and(|e| e >= 0) {
                return Err(GridError::InvalidBounds {
                    axis,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Build bounds from one inclusive range per axis.
    pub fn from_ranges(ranges: [RangeInclusive<isize>; N]) -> Result<Self, GridError> {
        let lower = std::array::from_fn(|axis| *ranges[axis].start());
        let upper = std::array::from_fn(|axis| *ranges[axis].end());
        Self::new(lower, upper)
    }

    #[inline]
    pub fn lower(&self) -> [isize; N] {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> [isize; N] {
        self.upper
    }

    /// Number of elements along `axis`. Never overflows: [`Bounds::new`]
    /// only admits extents that fit in `isize`.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        (self.upper[axis] - self.lower[axis] + 1) as usize
    }

    pub fn extents(&self) -> [usize; N] {
        std::array::from_fn(|axis| self.extent(axis))
    }

    /// Total element count, or `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.extents()
            .iter()
            .try_fold(1usize, |acc, &e| acc.checked_mul(e))
    }

    pub fn is_empty(&self) -> bool {
        self.extents().contains(&0)
    }

    /// Whether `idx` lies inside the bounds on every axis.
    #[inline]
    pub fn contains(&self, idx: &[isize; N]) -> bool {
        (0..N).all(|a| self.lower[a] <= idx[a] && idx[a] <= self.upper[a])
    }

    /// Iterate every coordinate in storage order (last axis fastest).
    pub fn indices(&self) -> IndexIter<N> {
        IndexIter {
            bounds: *self,
            next: self.lower,
            remaining: if self.is_empty() {
                0
            } else {
                self.checked_len().unwrap_or(0)
            },
        }
    }
}

/// Row-major walk over a [`Bounds`] box.
#[derive(Clone, Debug)]
pub struct IndexIter<const N: usize> {
    bounds: Bounds<N>,
    next: [isize; N],
    remaining: usize,
}

impl<const N: usize> Iterator for IndexIter<N> {
    type Item = [isize; N];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        for axis in (0..N).rev() {
            if self.next[axis] < self.bounds.upper[axis] {
                self.next[axis] += 1;
                break;
            }
            self.next[axis] = self.bounds.lower[axis];
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const N: usize> ExactSizeIterator for IndexIter<N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_axis_is_allowed() {
        let b = Bounds::new([1, 1], [0, 5]).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.extents(), [0, 5]);
        assert_eq!(b.indices().count(), 0);
    }

    #[test]
    fn inverted_axis_is_rejected() {
        let err = Bounds::new([0, 3], [4, 1]).unwrap_err();
        assert_eq!(
            err,
            GridError::InvalidBounds {
                axis: 1,
                lower: 3,
                upper: 1
            }
        );
    }

    #[test]
    fn extents_beyond_isize_are_rejected() {
        assert!(matches!(
            Bounds::from_ranges([0..=isize::MAX]),
            Err(GridError::InvalidBounds { axis: 0, .. })
        ));
        assert!(matches!(
            Bounds::from_ranges([1..=1, isize::MIN..=isize::MAX]),
            Err(GridError::InvalidBounds { axis: 1, .. })
        ));
        assert!(matches!(
            Bounds::new([isize::MIN], [isize::MAX - 1]),
            Err(GridError::InvalidBounds { .. })
        ));
        let widest = Bounds::from_ranges([1..=isize::MAX]).unwrap();
        assert_eq!(widest.extent(0), isize::MAX as usize);
        let empty = Bounds::new([isize::MAX], [isize::MAX - 1]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn indices_walk_last_axis_fastest() {
        let b = Bounds::from_ranges([-1..=0, 2..=3]).unwrap();
        let all: Vec<_> = b.indices().collect();
        assert_eq!(all, vec![[-1, 2], [-1, 3], [0, 2], [0, 3]]);
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Bounds::from_ranges([1..=4]).unwrap();
        assert!(b.contains(&[1]));
        assert!(b.contains(&[4]));
        assert!(!b.contains(&[0]));
        assert!(!b.contains(&[5]));
    }
}
