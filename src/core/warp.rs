//! Inverse-mapping warp engine.
//!
//! For each destination pixel, maps back to source pixel coordinates and
//! samples the source array. `warp_affine` covers grids linked by an exact
//! affine; `reproject` goes point-wise through a CRS transform for the
//! general case. Both leave destination pixels at `dst_nodata` wherever the
//! kernel has no valid source contribution.

use ndarray::{Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};

use crate::core::resample;
use crate::geometry::{Affine, CrsTransform, GeoBox};
use crate::types::{Pixel, RasterError, RasterResult, Resampling};

/// Warp `src` into `dst` where `dst_to_src` maps destination pixel
/// coordinates to source pixel coordinates.
pub fn warp_affine<T: Pixel>(
    src: ArrayView2<'_, T>,
    mut dst: ArrayViewMut2<'_, T>,
    dst_to_src: &Affine,
    resampling: Resampling,
    src_nodata: Option<T>,
    dst_nodata: T,
) {
    let fill_row = |(r, mut row): (usize, ArrayViewMut1<'_, T>)| {
        for (c, out) in row.iter_mut().enumerate() {
            let (x, y) = dst_to_src.apply(c as f64 + 0.5, r as f64 + 0.5);
            *out = resample::sample(&src, x, y, resampling, src_nodata).unwrap_or(dst_nodata);
        }
    };

    #[cfg(feature = "parallel")]
    {
        use ndarray::parallel::prelude::*;
        dst.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(fill_row);
    }
    #[cfg(not(feature = "parallel"))]
    dst.axis_iter_mut(Axis(0)).enumerate().for_each(fill_row);
}

/// General CRS-to-CRS reprojection of `src` onto the destination grid.
///
/// Destination pixels whose centers cannot be mapped into the source CRS
/// (outside the projection domain) stay at `dst_nodata`.
pub fn reproject<T: Pixel>(
    src: ArrayView2<'_, T>,
    mut dst: ArrayViewMut2<'_, T>,
    src_gbox: &GeoBox,
    dst_gbox: &GeoBox,
    resampling: Resampling,
    src_nodata: Option<T>,
    dst_nodata: T,
) -> RasterResult<()> {
    if src.dim() != src_gbox.shape() || dst.dim() != dst_gbox.shape() {
        return Err(RasterError::ShapeMismatch(format!(
            "array/GeoBox disagreement: src {:?} vs {:?}, dst {:?} vs {:?}",
            src.dim(),
            src_gbox.shape(),
            dst.dim(),
            dst_gbox.shape()
        )));
    }

    let dst_to_src_crs = CrsTransform::between(dst_gbox.crs(), src_gbox.crs())?;
    let src_px = src_gbox.transform().inverse()?;
    let dst_transform = dst_gbox.transform();

    let fill_row = |(r, mut row): (usize, ArrayViewMut1<'_, T>)| {
        for (c, out) in row.iter_mut().enumerate() {
            let (x, y) = dst_transform.apply(c as f64 + 0.5, r as f64 + 0.5);
            let sampled = dst_to_src_crs.apply(x, y).ok().and_then(|(x, y)| {
                let (sc, sr) = src_px.apply(x, y);
                resample::sample(&src, sc, sr, resampling, src_nodata)
            });
            *out = sampled.unwrap_or(dst_nodata);
        }
    };

    #[cfg(feature = "parallel")]
    {
        use ndarray::parallel::prelude::*;
        dst.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(fill_row);
    }
    #[cfg(not(feature = "parallel"))]
    dst.axis_iter_mut(Axis(0)).enumerate().for_each(fill_row);

    Ok(())
}

/// Allocating convenience wrapper around [`reproject`].
pub fn reproject_to_new<T: Pixel>(
    src: ArrayView2<'_, T>,
    src_gbox: &GeoBox,
    dst_gbox: &GeoBox,
    resampling: Resampling,
    src_nodata: Option<T>,
    dst_nodata: T,
) -> RasterResult<Array2<T>> {
    let mut dst = Array2::from_elem(dst_gbox.shape(), dst_nodata);
    reproject(
        src,
        dst.view_mut(),
        src_gbox,
        dst_gbox,
        resampling,
        src_nodata,
        dst_nodata,
    )?;
    Ok(dst)
}
