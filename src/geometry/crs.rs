//! Coordinate reference systems and point transforms between them.
//!
//! The pipeline only needs a CRS as an identity to compare grids with, plus
//! a point mapping for the general reprojection path. Equal CRSs map through
//! the identity; the geographic/Web Mercator pair (EPSG:4326 ↔ EPSG:3857,
//! spherical) is built in. Any other pair is an unsupported-CRS error at
//! resolution time, surfaced before any pixels are touched.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::types::{RasterError, RasterResult};

/// WGS84 semi-major axis, also the Web Mercator sphere radius.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// A coordinate reference system identified by EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(u32);

impl Crs {
    pub fn epsg(code: u32) -> Self {
        Crs(code)
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse `"EPSG:4326"` style authority strings.
    pub fn from_str(s: &str) -> RasterResult<Self> {
        let code = s
            .trim()
            .to_uppercase()
            .strip_prefix("EPSG:")
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| RasterError::InvalidTransform(format!("cannot parse CRS '{}'", s)))?;
        Ok(Crs(code))
    }

    /// Geographic longitude/latitude on WGS84.
    pub fn is_geographic(&self) -> bool {
        self.0 == 4326
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mapping {
    Identity,
    /// EPSG:4326 -> EPSG:3857
    LonLatToWebMercator,
    /// EPSG:3857 -> EPSG:4326
    WebMercatorToLonLat,
}

/// A resolved point transform from one CRS to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsTransform {
    src: Crs,
    dst: Crs,
    mapping: Mapping,
}

impl CrsTransform {
    /// Resolve the transform for a (src, dst) pair.
    ///
    /// Fails hard for pairs the crate has no mapping for; resolution happens
    /// up front so a bad CRS never gets as far as pixel I/O.
    pub fn between(src: Crs, dst: Crs) -> RasterResult<Self> {
        let mapping = match (src.code(), dst.code()) {
            (a, b) if a == b => Mapping::Identity,
            (4326, 3857) => Mapping::LonLatToWebMercator,
            (3857, 4326) => Mapping::WebMercatorToLonLat,
            _ => return Err(RasterError::UnsupportedCrs { src, dst }),
        };
        Ok(Self { src, dst, mapping })
    }

    pub fn src(&self) -> Crs {
        self.src
    }

    pub fn dst(&self) -> Crs {
        self.dst
    }

    pub fn is_identity(&self) -> bool {
        self.mapping == Mapping::Identity
    }

    /// Map a point from the source CRS to the destination CRS.
    pub fn apply(&self, x: f64, y: f64) -> RasterResult<(f64, f64)> {
        match self.mapping {
            Mapping::Identity => Ok((x, y)),
            Mapping::LonLatToWebMercator => lonlat_to_mercator(x, y),
            Mapping::WebMercatorToLonLat => Ok(mercator_to_lonlat(x, y)),
        }
    }

    /// Map a point from the destination CRS back to the source CRS.
    pub fn apply_inverse(&self, x: f64, y: f64) -> RasterResult<(f64, f64)> {
        match self.mapping {
            Mapping::Identity => Ok((x, y)),
            Mapping::LonLatToWebMercator => Ok(mercator_to_lonlat(x, y)),
            Mapping::WebMercatorToLonLat => lonlat_to_mercator(x, y),
        }
    }
}

/// Spherical Web Mercator forward projection.
///
///   x = R·λ,  y = R·ln(tan(π/4 + φ/2))
fn lonlat_to_mercator(lon: f64, lat: f64) -> RasterResult<(f64, f64)> {
    // Web Mercator is undefined at the poles
    if !(-90.0..=90.0).contains(&lat) || lat.abs() > 89.9999 {
        return Err(RasterError::InvalidTransform(format!(
            "latitude {} out of Web Mercator domain",
            lat
        )));
    }
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

/// Spherical Web Mercator inverse projection.
///
///   λ = x/R,  φ = 2·atan(exp(y/R)) - π/2
fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}
