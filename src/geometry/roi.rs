//! Pixel-space regions of interest.
//!
//! A `Roi` is a half-open row/column rectangle `[row0, row1) × [col0, col1)`
//! used to address sub-regions of rasters and GeoBoxes.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub row0: usize,
    pub row1: usize,
    pub col0: usize,
    pub col1: usize,
}

impl Roi {
    pub fn new(row0: usize, row1: usize, col0: usize, col1: usize) -> Self {
        Self {
            row0,
            row1,
            col0,
            col1,
        }
    }

    /// The canonical empty region.
    pub fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// The region covering a whole `(rows, cols)` array.
    pub fn full(shape: (usize, usize)) -> Self {
        Self::new(0, shape.0, 0, shape.1)
    }

    pub fn shape(&self) -> (usize, usize) {
        (
            self.row1.saturating_sub(self.row0),
            self.col1.saturating_sub(self.col0),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.row1 <= self.row0 || self.col1 <= self.col0
    }

    /// Covers all of an array of the given shape.
    pub fn is_full(&self, shape: (usize, usize)) -> bool {
        self.row0 == 0 && self.col0 == 0 && self.row1 == shape.0 && self.col1 == shape.1
    }

    pub fn rows(&self) -> Range<usize> {
        self.row0..self.row1
    }

    pub fn cols(&self) -> Range<usize> {
        self.col0..self.col1
    }

    pub fn intersect(&self, other: &Roi) -> Roi {
        let r = Roi {
            row0: self.row0.max(other.row0),
            row1: self.row1.min(other.row1),
            col0: self.col0.max(other.col0),
            col1: self.col1.min(other.col1),
        };
        if r.is_empty() {
            Roi::empty()
        } else {
            r
        }
    }

    /// Grow by `margin` pixels on every side, clamped to `bounds` (an array
    /// shape). Used to avoid seams when a warp falls back from the paste path.
    pub fn pad(&self, margin: usize, bounds: (usize, usize)) -> Roi {
        if self.is_empty() {
            return *self;
        }
        Roi {
            row0: self.row0.saturating_sub(margin),
            row1: (self.row1 + margin).min(bounds.0),
            col0: self.col0.saturating_sub(margin),
            col1: (self.col1 + margin).min(bounds.1),
        }
    }

    /// Snap fractional pixel bounds to a whole-pixel region, rounding outward
    /// (floor the mins, ceil the maxs) and clipping to `bounds`.
    ///
    /// Outward rounding guarantees a source region is never under-read;
    /// an interval that falls entirely outside the array clips to empty.
    pub fn from_float_bounds(
        rmin: f64,
        rmax: f64,
        cmin: f64,
        cmax: f64,
        bounds: (usize, usize),
    ) -> Roi {
        // small tolerance so e.g. 4.9999999999 snaps to 5, not ceil -> 5 anyway,
        // but 5.0000000001 does not drag in a sixth pixel
        const EPS: f64 = 1e-6;
        let clamp = |v: f64, hi: usize| v.max(0.0).min(hi as f64);

        let r0 = clamp((rmin + EPS).floor(), bounds.0);
        let r1 = clamp((rmax - EPS).ceil(), bounds.0);
        let c0 = clamp((cmin + EPS).floor(), bounds.1);
        let c1 = clamp((cmax - EPS).ceil(), bounds.1);

        let roi = Roi {
            row0: r0 as usize,
            row1: r1 as usize,
            col0: c0 as usize,
            col1: c1 as usize,
        };
        if roi.is_empty() {
            Roi::empty()
        } else {
            roi
        }
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}, {}:{}]",
            self.row0, self.row1, self.col0, self.col1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_empty() {
        let roi = Roi::new(2, 7, 3, 10);
        assert_eq!(roi.shape(), (5, 7));
        assert!(!roi.is_empty());
        assert!(Roi::empty().is_empty());
        assert_eq!(Roi::empty().shape(), (0, 0));
    }

    #[test]
    fn test_full() {
        let roi = Roi::full((4, 6));
        assert!(roi.is_full((4, 6)));
        assert!(!Roi::new(0, 4, 0, 5).is_full((4, 6)));
    }

    #[test]
    fn test_intersect() {
        let a = Roi::new(0, 10, 0, 10);
        let b = Roi::new(5, 15, 8, 20);
        assert_eq!(a.intersect(&b), Roi::new(5, 10, 8, 10));

        let c = Roi::new(20, 30, 0, 10);
        assert!(a.intersect(&c).is_empty());
    }

    #[test]
    fn test_pad_clamps_to_bounds() {
        let roi = Roi::new(0, 3, 4, 8);
        assert_eq!(roi.pad(1, (10, 8)), Roi::new(0, 4, 3, 8));
        assert!(Roi::empty().pad(1, (10, 10)).is_empty());
    }

    #[test]
    fn test_from_float_bounds_rounds_outward() {
        let roi = Roi::from_float_bounds(1.2, 4.8, 0.4, 6.5, (10, 10));
        assert_eq!(roi, Roi::new(1, 5, 0, 7));
    }

    #[test]
    fn test_from_float_bounds_snaps_near_integers() {
        let roi = Roi::from_float_bounds(-1e-9, 5.0 + 1e-9, 0.0, 5.0, (10, 10));
        assert_eq!(roi, Roi::new(0, 5, 0, 5));
    }

    #[test]
    fn test_from_float_bounds_outside_is_empty() {
        assert!(Roi::from_float_bounds(-8.0, -2.0, 0.0, 5.0, (10, 10)).is_empty());
        assert!(Roi::from_float_bounds(12.0, 15.0, 0.0, 5.0, (10, 10)).is_empty());
    }
}
