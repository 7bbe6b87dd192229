//! rastercube: reprojected reads and fused composites for Earth-observation
//! rasters
//!
//! This library takes rasters on arbitrary geospatial grids and loads them
//! onto a caller-chosen destination grid. Where source and destination grids
//! align it copies pixels directly (with optional decimation and axis flips);
//! otherwise it resamples through an affine warp or a full coordinate
//! reprojection. Overlapping sources fuse into a single composite, and bulk
//! loads assemble per-measurement `(time, y, x)` cubes through a pluggable
//! reader driver.

pub mod core;
pub mod geometry;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BandInfo, FuseFn, Measurement, Pixel, RasterError, RasterResult, Resampling,
};

pub use geometry::{Affine, Crs, CrsTransform, GeoBox, Roi};

pub use crate::core::{
    compute_reproject_roi, load, read_time_slice, read_time_slice_to_buffer, reproject_and_fuse,
    LoadedData, PixelTransform, ReprojectRoi, SourceGroup,
};

pub use io::{MemoryDriver, MemorySource, PendingReader, RasterReader, RasterSource, ReaderDriver};
