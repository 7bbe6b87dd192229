//! Multi-source composition.
//!
//! `reproject_and_fuse` merges every source that overlaps a destination
//! grid into one array, first-writer-wins per pixel in source-list order.

use ndarray::{s, Array2, ArrayView2, ArrayViewMut2, Zip};

use crate::core::read::read_time_slice;
use crate::geometry::GeoBox;
use crate::io::reader::RasterSource;
use crate::types::{matches_nodata, FuseFn, Pixel, RasterError, RasterResult, Resampling};

/// Progress callback: `(sources processed so far, total sources)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);

/// Default fuse policy: overwrite only destination pixels that still hold
/// `dst_nodata` ("copy-if-invalid").
pub fn default_fuser<T: Pixel>(
    mut dst: ArrayViewMut2<'_, T>,
    src: ArrayView2<'_, T>,
    dst_nodata: T,
) {
    Zip::from(&mut dst).and(&src).for_each(|d, &s| {
        if matches_nodata(*d, dst_nodata) {
            *d = s;
        }
    });
}

/// Reproject and fuse `sources` into `destination`.
///
/// The destination is filled with `dst_nodata` up front, so afterwards every
/// pixel is either a source-derived value or exactly `dst_nodata`. Sources
/// are processed in list order; with the default policy, later sources never
/// overwrite pixels an earlier source filled.
///
/// With `skip_broken_datasets` a failing open/read is logged and the source
/// contributes nothing; without it the first failure aborts the composite.
#[allow(clippy::too_many_arguments)]
pub fn reproject_and_fuse<T: Pixel>(
    sources: &[&dyn RasterSource<T>],
    mut destination: ArrayViewMut2<'_, T>,
    dst_gbox: &GeoBox,
    dst_nodata: T,
    resampling: Resampling,
    fuse_func: Option<FuseFn<T>>,
    skip_broken_datasets: bool,
    mut progress_cbk: Option<ProgressFn<'_>>,
) -> RasterResult<()> {
    if destination.dim() != dst_gbox.shape() {
        return Err(RasterError::ShapeMismatch(format!(
            "destination {:?} does not match GeoBox {:?}",
            destination.dim(),
            dst_gbox.shape()
        )));
    }

    destination.fill(dst_nodata);
    let n_total = sources.len();

    if n_total == 0 {
        return Ok(());
    }

    if n_total == 1 {
        // single source writes straight into the destination, no scratch
        let result = sources[0].open().and_then(|mut rdr| {
            read_time_slice(
                rdr.as_mut(),
                destination.view_mut(),
                dst_gbox,
                resampling,
                dst_nodata,
                None,
            )
        });
        match result {
            Ok(_) => {}
            Err(e) if skip_broken_datasets => {
                log::warn!("skipping broken source: {}", e);
                // the failed read may have left partial pixels behind
                destination.fill(dst_nodata);
            }
            Err(e) => return Err(e),
        }
        if let Some(cbk) = progress_cbk.as_mut() {
            cbk(1, 1);
        }
        return Ok(());
    }

    let mut scratch = Array2::from_elem(destination.dim(), dst_nodata);

    for (n_done, source) in sources.iter().enumerate() {
        let result = source.open().and_then(|mut rdr| {
            read_time_slice(
                rdr.as_mut(),
                scratch.view_mut(),
                dst_gbox,
                resampling,
                dst_nodata,
                None,
            )
        });

        match result {
            Ok(roi) if !roi.is_empty() => {
                let dst_slice = destination.slice_mut(s![roi.rows(), roi.cols()]);
                let src_slice = scratch.slice(s![roi.rows(), roi.cols()]);
                match fuse_func {
                    Some(fuse) => fuse(dst_slice, src_slice),
                    None => default_fuser(dst_slice, src_slice, dst_nodata),
                }
                // reuse must not leak this source's pixels into the next read
                scratch
                    .slice_mut(s![roi.rows(), roi.cols()])
                    .fill(dst_nodata);
            }
            Ok(_) => {}
            Err(e) if skip_broken_datasets => {
                log::warn!("skipping broken source: {}", e);
                // affected region unknown after a mid-read failure
                scratch.fill(dst_nodata);
            }
            Err(e) => return Err(e),
        }

        if let Some(cbk) = progress_cbk.as_mut() {
            cbk(n_done + 1, n_total);
        }
    }

    Ok(())
}
