//! Geometric primitives: affine transforms, CRSs, pixel regions, GeoBoxes.

pub mod affine;
pub mod crs;
pub mod geobox;
pub mod roi;

pub use affine::Affine;
pub use crs::{Crs, CrsTransform};
pub use geobox::GeoBox;
pub use roi::Roi;
