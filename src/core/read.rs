//! Single-source time-slice reads.
//!
//! Reads one opened source into one destination grid, routing between the
//! direct paste path and the resampling warp path. Two calling conventions
//! share one read plan: `read_time_slice` writes into a caller-supplied
//! array, `read_time_slice_to_buffer` returns a freshly allocated buffer
//! for callers that must not touch a shared array.

use ndarray::{s, Array2, ArrayViewMut2, Axis, Zip};

use crate::core::paste::{can_paste, is_almost_int, SCALE_TOL, TRANSLATION_TOL, TRANSLATION_TOL_NN};
use crate::core::reproject_roi::{compute_reproject_roi, ReprojectRoi};
use crate::core::warp;
use crate::geometry::{Affine, GeoBox, Roi};
use crate::io::reader::{RasterReader, ReadArgs};
use crate::types::{matches_nodata, Pixel, RasterError, RasterResult, Resampling};

/// Integer read-decimation factor for a given overlap scale.
///
/// Scales snap up to the nearest integer when within `tol` (2.999999 reads
/// at overview 3), otherwise round down (2.8 reads at overview 2); never
/// below 1 — upsampling must read every needed source pixel.
pub fn pick_read_scale(scale: f64, tol: f64) -> usize {
    if scale < 1.0 {
        return 1;
    }
    let s = if is_almost_int(scale, tol) {
        scale.round()
    } else {
        scale.floor()
    };
    (s as usize).max(1)
}

fn reader_geobox<T: Pixel>(rdr: &dyn RasterReader<T>) -> RasterResult<GeoBox> {
    let (rows, cols) = rdr.shape();
    let transform = rdr.transform();
    // an identity geotransform means the file carries no geo-registration
    if transform == Affine::identity() {
        return Err(RasterError::InvalidTransform(
            "source has an identity geotransform (missing geolocation)".into(),
        ));
    }
    GeoBox::new(cols, rows, transform, rdr.crs())
}

/// One resolved read: which pixels to fetch and how to place them.
enum ReadPlan {
    Paste {
        rr: ReprojectRoi,
        flip_x: bool,
        flip_y: bool,
    },
    Warp {
        rr: ReprojectRoi,
        /// GeoBox of the pixels actually read (sliced, possibly decimated).
        src_read: GeoBox,
        /// GeoBox of the affected destination region.
        dst_sub: GeoBox,
    },
}

fn plan_read(
    src_gbox: &GeoBox,
    dst_gbox: &GeoBox,
    resampling: Resampling,
    paste_capable: bool,
) -> RasterResult<Option<ReadPlan>> {
    let rr = compute_reproject_roi(src_gbox, dst_gbox)?;
    if rr.is_empty() {
        return Ok(None);
    }

    let ttol = if resampling.is_nearest() {
        TRANSLATION_TOL_NN
    } else {
        TRANSLATION_TOL
    };

    if paste_capable {
        match can_paste(&rr, SCALE_TOL, ttol) {
            // paste legality implies the transform is ST, hence linear
            Ok(()) => {
                if let Some(a) = rr.transform.linear() {
                    return Ok(Some(ReadPlan::Paste {
                        rr,
                        flip_x: a.a < 0.0,
                        flip_y: a.e < 0.0,
                    }));
                }
            }
            Err(reason) => log::debug!("paste rejected ({}), warping instead", reason),
        }
    }

    let mut rr = rr;
    if rr.is_st() {
        // tight ROI bounds would leave a visible one-pixel seam at tile
        // edges once the kernel needs neighbours; widen both sides
        rr.roi_dst = rr.roi_dst.pad(1, dst_gbox.shape());
        rr.roi_src = rr.roi_src.pad(1, src_gbox.shape());
    }

    let read_scale = pick_read_scale(rr.scale, SCALE_TOL);
    let dst_sub = dst_gbox.slice(&rr.roi_dst);
    let mut src_read = src_gbox.slice(&rr.roi_src);
    if read_scale > 1 {
        src_read = src_read.zoom_out(read_scale as f64);
    }

    Ok(Some(ReadPlan::Warp {
        rr,
        src_read,
        dst_sub,
    }))
}

/// Read one source into `dst`, which must match `dst_gbox`'s shape.
///
/// Returns the destination region actually affected; an empty region means
/// the source does not intersect the destination and nothing was written.
pub fn read_time_slice<T: Pixel>(
    rdr: &mut dyn RasterReader<T>,
    mut dst: ArrayViewMut2<'_, T>,
    dst_gbox: &GeoBox,
    resampling: Resampling,
    dst_nodata: T,
    extra_dim_index: Option<usize>,
) -> RasterResult<Roi> {
    if dst.dim() != dst_gbox.shape() {
        return Err(RasterError::ShapeMismatch(format!(
            "destination {:?} does not match GeoBox {:?}",
            dst.dim(),
            dst_gbox.shape()
        )));
    }

    let src_gbox = reader_geobox(rdr)?;
    let plan = match plan_read(&src_gbox, dst_gbox, resampling, rdr.supports_paste())? {
        Some(plan) => plan,
        None => return Ok(Roi::empty()),
    };

    match plan {
        ReadPlan::Paste { rr, flip_x, flip_y } => {
            let mut pix = rdr.read(
                ReadArgs::normalized(rr.roi_src, rr.roi_dst.shape(), rdr.shape())
                    .with_extra_dim_index(extra_dim_index),
            )?;
            if pix.dim() != rr.roi_dst.shape() {
                return Err(RasterError::ShapeMismatch(format!(
                    "reader returned {:?}, expected {:?}",
                    pix.dim(),
                    rr.roi_dst.shape()
                )));
            }
            if flip_x {
                pix.invert_axis(Axis(1));
            }
            if flip_y {
                pix.invert_axis(Axis(0));
            }

            let mut out = dst.slice_mut(s![rr.roi_dst.rows(), rr.roi_dst.cols()]);
            match rdr.nodata() {
                None => out.assign(&pix),
                Some(nd) => Zip::from(&mut out).and(&pix).for_each(|d, &p| {
                    if !matches_nodata(p, nd) {
                        *d = p;
                    }
                }),
            }
            Ok(rr.roi_dst)
        }
        ReadPlan::Warp {
            rr,
            src_read,
            dst_sub,
        } => {
            let pix = rdr.read(
                ReadArgs::normalized(rr.roi_src, src_read.shape(), rdr.shape())
                    .with_extra_dim_index(extra_dim_index),
            )?;
            let out = dst.slice_mut(s![rr.roi_dst.rows(), rr.roi_dst.cols()]);

            if rr.transform.linear().is_some() {
                let dst_to_src = src_read.transform().inverse()? * dst_sub.transform();
                warp::warp_affine(
                    pix.view(),
                    out,
                    &dst_to_src,
                    resampling,
                    rdr.nodata(),
                    dst_nodata,
                );
            } else {
                warp::reproject(
                    pix.view(),
                    out,
                    &src_read,
                    &dst_sub,
                    resampling,
                    rdr.nodata(),
                    dst_nodata,
                )?;
            }
            Ok(rr.roi_dst)
        }
    }
}

/// Allocating variant of [`read_time_slice`]: returns the pixels read (or
/// `None` when the source does not intersect) plus the destination region
/// they cover. Source nodata is normalised to `dst_nodata` in the returned
/// buffer.
pub fn read_time_slice_to_buffer<T: Pixel>(
    rdr: &mut dyn RasterReader<T>,
    dst_gbox: &GeoBox,
    resampling: Resampling,
    dst_nodata: T,
) -> RasterResult<(Option<Array2<T>>, Roi)> {
    let src_gbox = reader_geobox(rdr)?;
    let plan = match plan_read(&src_gbox, dst_gbox, resampling, rdr.supports_paste())? {
        Some(plan) => plan,
        None => return Ok((None, Roi::empty())),
    };

    match plan {
        ReadPlan::Paste { rr, flip_x, flip_y } => {
            let mut pix =
                rdr.read(ReadArgs::normalized(rr.roi_src, rr.roi_dst.shape(), rdr.shape()))?;
            if pix.dim() != rr.roi_dst.shape() {
                return Err(RasterError::ShapeMismatch(format!(
                    "reader returned {:?}, expected {:?}",
                    pix.dim(),
                    rr.roi_dst.shape()
                )));
            }
            if flip_x {
                pix.invert_axis(Axis(1));
            }
            if flip_y {
                pix.invert_axis(Axis(0));
            }
            if let Some(nd) = rdr.nodata() {
                if !matches_nodata(nd, dst_nodata) {
                    pix.mapv_inplace(|v| if matches_nodata(v, nd) { dst_nodata } else { v });
                }
            }
            Ok((Some(pix), rr.roi_dst))
        }
        ReadPlan::Warp {
            rr,
            src_read,
            dst_sub,
        } => {
            let pix =
                rdr.read(ReadArgs::normalized(rr.roi_src, src_read.shape(), rdr.shape()))?;
            let mut out = Array2::from_elem(dst_sub.shape(), dst_nodata);

            if rr.transform.linear().is_some() {
                let dst_to_src = src_read.transform().inverse()? * dst_sub.transform();
                warp::warp_affine(
                    pix.view(),
                    out.view_mut(),
                    &dst_to_src,
                    resampling,
                    rdr.nodata(),
                    dst_nodata,
                );
            } else {
                warp::reproject(
                    pix.view(),
                    out.view_mut(),
                    &src_read,
                    &dst_sub,
                    resampling,
                    rdr.nodata(),
                    dst_nodata,
                )?;
            }
            Ok((Some(out), rr.roi_dst))
        }
    }
}
