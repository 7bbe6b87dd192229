//! GeoBox: a rectangular pixel grid anchored to the world.
//!
//! Combines a shape, an affine pixel→CRS transform and a CRS into one
//! immutable value. GeoBoxes are constructed per read from dataset or
//! destination metadata and cheaply derived from one another by slicing
//! and decimation.

use serde::{Deserialize, Serialize};

use crate::geometry::{Affine, Crs, Roi};
use crate::types::{RasterError, RasterResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    width: usize,
    height: usize,
    transform: Affine,
    crs: Crs,
}

impl GeoBox {
    /// Construct a GeoBox; rejects degenerate (non-invertible) transforms.
    pub fn new(width: usize, height: usize, transform: Affine, crs: Crs) -> RasterResult<Self> {
        if transform.determinant().abs() < f64::EPSILON {
            return Err(RasterError::InvalidTransform(
                "GeoBox transform has degenerate scale".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            transform,
            crs,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, cols)` array shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Sub-grid covering `roi`, keeping the pixel lattice: the new transform
    /// is the old one shifted by the region's origin.
    pub fn slice(&self, roi: &Roi) -> GeoBox {
        let (rows, cols) = roi.shape();
        GeoBox {
            width: cols,
            height: rows,
            transform: self.transform * Affine::translation(roi.col0 as f64, roi.row0 as f64),
            crs: self.crs,
        }
    }

    /// Decimated grid: same footprint, `factor`-times coarser pixels.
    pub fn zoom_out(&self, factor: f64) -> GeoBox {
        debug_assert!(factor >= 1.0);
        GeoBox {
            width: (self.width as f64 / factor).ceil() as usize,
            height: (self.height as f64 / factor).ceil() as usize,
            transform: self.transform * Affine::scale(factor, factor),
            crs: self.crs,
        }
    }

    /// The four pixel-space corners `(col, row)`, clockwise from the origin.
    pub fn pixel_corners(&self) -> [(f64, f64); 4] {
        let (w, h) = (self.width as f64, self.height as f64);
        [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
    }

    /// Evenly spaced points along the grid boundary in pixel space, used to
    /// bound footprints under non-linear CRS transforms where corners alone
    /// under-estimate curved edges.
    pub fn boundary_points(&self, per_edge: usize) -> Vec<(f64, f64)> {
        let n = per_edge.max(1);
        let (w, h) = (self.width as f64, self.height as f64);
        let mut pts = Vec::with_capacity(4 * n);
        for i in 0..n {
            let t = i as f64 / n as f64;
            pts.push((w * t, 0.0));
            pts.push((w, h * t));
            pts.push((w * (1.0 - t), h));
            pts.push((0.0, h * (1.0 - t)));
        }
        pts
    }

    /// World coordinates of a pixel-space point.
    pub fn to_world(&self, col: f64, row: f64) -> (f64, f64) {
        self.transform.apply(col, row)
    }
}

impl std::fmt::Display for GeoBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeoBox({}x{}, {})", self.width, self.height, self.crs)
    }
}
