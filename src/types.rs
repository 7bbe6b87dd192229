use ndarray::{ArrayView2, ArrayViewMut2};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

use crate::geometry::Crs;

/// Pixel value type for raster arrays.
///
/// Blanket-implemented for every numeric type that can round-trip through
/// `f64` for resampling arithmetic.
pub trait Pixel: Copy + PartialEq + PartialOrd + NumCast + Send + Sync + 'static {}

impl<T> Pixel for T where T: Copy + PartialEq + PartialOrd + NumCast + Send + Sync + 'static {}

/// True when `v` should be treated as the nodata sentinel `nodata`.
///
/// A plain equality test, except that a NaN pixel matches a NaN sentinel
/// (floating-point nodata is commonly NaN and `NaN != NaN`).
pub fn matches_nodata<T: Pixel>(v: T, nodata: T) -> bool {
    if v == nodata {
        return true;
    }
    let v: Option<f64> = num_traits::cast(v);
    let nd: Option<f64> = num_traits::cast(nodata);
    matches!((v, nd), (Some(v), Some(nd)) if v.is_nan() && nd.is_nan())
}

/// True when `v` carries a real observation.
///
/// A source that declares no nodata has only valid pixels.
pub fn is_valid<T: Pixel>(v: T, nodata: Option<T>) -> bool {
    match nodata {
        Some(nd) => !matches_nodata(v, nd),
        None => true,
    }
}

/// Resampling method used when a source must be warped onto the
/// destination grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resampling {
    Nearest,
    Bilinear,
    Cubic,
    Average,
}

impl Resampling {
    /// Parse from a method name, e.g. `"bilinear"`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "bilinear" => Some(Self::Bilinear),
            "cubic" => Some(Self::Cubic),
            "average" => Some(Self::Average),
            _ => None,
        }
    }

    /// Nearest-neighbour tolerates much larger sub-pixel misalignment than
    /// interpolating kernels, so the paste classifier is given a looser
    /// translation tolerance for it.
    pub fn is_nearest(&self) -> bool {
        matches!(self, Self::Nearest)
    }
}

impl std::fmt::Display for Resampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resampling::Nearest => write!(f, "nearest"),
            Resampling::Bilinear => write!(f, "bilinear"),
            Resampling::Cubic => write!(f, "cubic"),
            Resampling::Average => write!(f, "average"),
        }
    }
}

/// Descriptor for one band of one dataset.
///
/// Identifies what to open through the driver layer: the resource URI, the
/// band index within it and, for stacked files, which layer of the extra
/// dimension holds this observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandInfo {
    pub uri: String,
    /// 1-based band index within the resource.
    pub band: usize,
    /// Extra-dimension (e.g. stacked time axis) slice within the band.
    pub layer: Option<usize>,
    /// Nodata override; when absent the reader's declared nodata is used.
    pub nodata: Option<f64>,
}

impl BandInfo {
    pub fn new(uri: impl Into<String>, band: usize) -> Self {
        Self {
            uri: uri.into(),
            band,
            layer: None,
            nodata: None,
        }
    }

    pub fn with_layer(mut self, layer: usize) -> Self {
        self.layer = Some(layer);
        self
    }
}

/// In-place merge of one source slice into a destination slice.
///
/// Stateless by contract; the default policy only overwrites destination
/// pixels that still hold nodata.
pub type FuseFn<T> = fn(ArrayViewMut2<'_, T>, ArrayView2<'_, T>);

/// One output variable of a load: its name, fill value and per-measurement
/// read policy.
#[derive(Debug, Clone)]
pub struct Measurement<T: Pixel> {
    pub name: String,
    pub nodata: T,
    pub resampling: Resampling,
    pub fuser: Option<FuseFn<T>>,
}

impl<T: Pixel> Measurement<T> {
    pub fn new(name: impl Into<String>, nodata: T) -> Self {
        Self {
            name: name.into(),
            nodata,
            resampling: Resampling::Nearest,
            fuser: None,
        }
    }

    pub fn with_resampling(mut self, resampling: Resampling) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn with_fuser(mut self, fuser: FuseFn<T>) -> Self {
        self.fuser = Some(fuser);
        self
    }
}

/// Error types for raster pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Invalid geotransform: {0}")]
    InvalidTransform(String),

    #[error("Unsupported CRS transform: {src} -> {dst}")]
    UnsupportedCrs { src: Crs, dst: Crs },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Read failed for '{band}': {reason}")]
    Read { band: String, reason: String },

    #[error("Driver error: {0}")]
    Driver(String),
}

/// Result type for raster pipeline operations
pub type RasterResult<T> = Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_nodata_plain() {
        assert!(matches_nodata(-1i32, -1));
        assert!(!matches_nodata(7i32, -1));
    }

    #[test]
    fn test_matches_nodata_nan() {
        assert!(matches_nodata(f32::NAN, f32::NAN));
        assert!(!matches_nodata(1.5f32, f32::NAN));
        assert!(!matches_nodata(f32::NAN, -9999.0));
    }

    #[test]
    fn test_is_valid_without_nodata() {
        assert!(is_valid(-9999.0f64, None));
        assert!(!is_valid(-9999.0f64, Some(-9999.0)));
    }

    #[test]
    fn test_resampling_from_name() {
        assert_eq!(Resampling::from_name("nearest"), Some(Resampling::Nearest));
        assert_eq!(Resampling::from_name("Bilinear"), Some(Resampling::Bilinear));
        assert_eq!(Resampling::from_name("mode"), None);
        assert!(Resampling::Nearest.is_nearest());
        assert!(!Resampling::Cubic.is_nearest());
    }
}
