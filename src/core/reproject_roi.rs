//! Overlap computation between a source and a destination grid.
//!
//! `compute_reproject_roi` answers three questions before any pixel I/O
//! happens: which destination pixels can this source contribute to, which
//! source pixels are needed to cover them, and what kind of transform links
//! the two lattices (pure scale+translate, general linear, or a full
//! CRS-to-CRS mapping).

use crate::geometry::{Affine, CrsTransform, GeoBox, Roi};
use crate::types::RasterResult;

/// Off-diagonal tolerance when classifying a transform as scale+translate.
const ST_TOL: f64 = 1e-8;

/// Boundary sampling density for non-linear footprints.
const BOUNDARY_PTS_PER_EDGE: usize = 8;

/// The composed source-pixel to destination-pixel map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelTransform {
    /// Grids share a CRS; the map is an exact affine.
    Linear { affine: Affine, is_st: bool },
    /// Grids are in different CRSs; the map goes point-wise through the
    /// projection and has no closed affine form.
    NonLinear,
}

impl PixelTransform {
    pub fn linear(&self) -> Option<Affine> {
        match self {
            PixelTransform::Linear { affine, .. } => Some(*affine),
            PixelTransform::NonLinear => None,
        }
    }

    pub fn is_st(&self) -> bool {
        matches!(self, PixelTransform::Linear { is_st: true, .. })
    }
}

/// Result of overlap computation for one (source, destination) pair.
///
/// `roi_dst` is empty iff the footprints do not intersect; downstream
/// stages treat that as a silent no-op, never an error.
#[derive(Debug, Clone, Copy)]
pub struct ReprojectRoi {
    /// Source pixels needed to cover `roi_dst` (rounded outward).
    pub roi_src: Roi,
    /// Destination pixels the source footprint covers.
    pub roi_dst: Roi,
    /// Composed src→dst pixel transform.
    pub transform: PixelTransform,
    /// Approximate source pixels consumed per destination pixel
    /// (geometric mean across axes); > 1 means the source is finer.
    pub scale: f64,
}

impl ReprojectRoi {
    pub fn is_st(&self) -> bool {
        self.transform.is_st()
    }

    pub fn is_empty(&self) -> bool {
        self.roi_dst.is_empty()
    }

    fn empty(transform: PixelTransform, scale: f64) -> Self {
        Self {
            roi_src: Roi::empty(),
            roi_dst: Roi::empty(),
            transform,
            scale,
        }
    }
}

/// Compute overlapping pixel regions and transform classification for a
/// (source, destination) GeoBox pair.
pub fn compute_reproject_roi(src_gbox: &GeoBox, dst_gbox: &GeoBox) -> RasterResult<ReprojectRoi> {
    if src_gbox.crs() == dst_gbox.crs() {
        linear_roi(src_gbox, dst_gbox)
    } else {
        nonlinear_roi(src_gbox, dst_gbox)
    }
}

fn bounds_of(points: impl Iterator<Item = (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut b: Option<(f64, f64, f64, f64)> = None;
    for (c, r) in points {
        if !c.is_finite() || !r.is_finite() {
            continue;
        }
        b = Some(match b {
            None => (r, r, c, c),
            Some((rmin, rmax, cmin, cmax)) => (rmin.min(r), rmax.max(r), cmin.min(c), cmax.max(c)),
        });
    }
    b
}

fn linear_roi(src_gbox: &GeoBox, dst_gbox: &GeoBox) -> RasterResult<ReprojectRoi> {
    // src px -> world -> dst px
    let src_to_dst = dst_gbox.transform().inverse()? * src_gbox.transform();
    let dst_to_src = src_to_dst.inverse()?;

    let is_st = src_to_dst.is_scale_translate(ST_TOL);
    let transform = PixelTransform::Linear {
        affine: src_to_dst,
        is_st,
    };

    // scale from the column norms of the dst->src map: how many source
    // pixels one destination pixel step covers along each axis
    let sx = (dst_to_src.a.powi(2) + dst_to_src.d.powi(2)).sqrt();
    let sy = (dst_to_src.b.powi(2) + dst_to_src.e.powi(2)).sqrt();
    let scale = (sx * sy).sqrt();

    // destination region covered by the source footprint
    let (rmin, rmax, cmin, cmax) = match bounds_of(
        src_gbox
            .pixel_corners()
            .iter()
            .map(|&(c, r)| src_to_dst.apply(c, r)),
    ) {
        Some(b) => b,
        None => return Ok(ReprojectRoi::empty(transform, scale)),
    };
    let roi_dst = Roi::from_float_bounds(rmin, rmax, cmin, cmax, dst_gbox.shape());
    if roi_dst.is_empty() {
        return Ok(ReprojectRoi::empty(transform, scale));
    }

    // source region needed to cover it, rounded outward so the read can
    // never come up short
    let dst_corners = [
        (roi_dst.col0 as f64, roi_dst.row0 as f64),
        (roi_dst.col1 as f64, roi_dst.row0 as f64),
        (roi_dst.col1 as f64, roi_dst.row1 as f64),
        (roi_dst.col0 as f64, roi_dst.row1 as f64),
    ];
    let (rmin, rmax, cmin, cmax) =
        match bounds_of(dst_corners.iter().map(|&(c, r)| dst_to_src.apply(c, r))) {
            Some(b) => b,
            None => return Ok(ReprojectRoi::empty(transform, scale)),
        };
    let roi_src = Roi::from_float_bounds(rmin, rmax, cmin, cmax, src_gbox.shape());
    if roi_src.is_empty() {
        return Ok(ReprojectRoi::empty(transform, scale));
    }

    Ok(ReprojectRoi {
        roi_src,
        roi_dst,
        transform,
        scale,
    })
}

fn nonlinear_roi(src_gbox: &GeoBox, dst_gbox: &GeoBox) -> RasterResult<ReprojectRoi> {
    // resolved up front: an unsupported CRS pair is a hard error before
    // any pixel is read
    let to_dst_crs = CrsTransform::between(src_gbox.crs(), dst_gbox.crs())?;
    let src_inv = src_gbox.transform().inverse()?;
    let dst_inv = dst_gbox.transform().inverse()?;

    // destination region covered by the source footprint; boundary points
    // that fall outside the projection domain are simply skipped
    let dst_bounds = bounds_of(
        src_gbox
            .boundary_points(BOUNDARY_PTS_PER_EDGE)
            .into_iter()
            .filter_map(|(c, r)| {
                let (x, y) = src_gbox.to_world(c, r);
                to_dst_crs.apply(x, y).ok().map(|(x, y)| dst_inv.apply(x, y))
            }),
    );
    let (rmin, rmax, cmin, cmax) = match dst_bounds {
        Some(b) => b,
        None => return Ok(ReprojectRoi::empty(PixelTransform::NonLinear, 1.0)),
    };
    let roi_dst = Roi::from_float_bounds(rmin, rmax, cmin, cmax, dst_gbox.shape());
    if roi_dst.is_empty() {
        return Ok(ReprojectRoi::empty(PixelTransform::NonLinear, 1.0));
    }

    // map the clipped destination region's boundary back into source pixel
    // space; pad one pixel since sampled edges under-estimate curvature
    let dst_sub = dst_gbox.slice(&roi_dst);
    let src_bounds = bounds_of(
        dst_sub
            .boundary_points(BOUNDARY_PTS_PER_EDGE)
            .into_iter()
            .filter_map(|(c, r)| {
                let (x, y) = dst_sub.to_world(c, r);
                to_dst_crs
                    .apply_inverse(x, y)
                    .ok()
                    .map(|(x, y)| src_inv.apply(x, y))
            }),
    );
    let (rmin, rmax, cmin, cmax) = match src_bounds {
        Some(b) => b,
        None => return Ok(ReprojectRoi::empty(PixelTransform::NonLinear, 1.0)),
    };
    let roi_src =
        Roi::from_float_bounds(rmin, rmax, cmin, cmax, src_gbox.shape()).pad(1, src_gbox.shape());
    if roi_src.is_empty() {
        return Ok(ReprojectRoi::empty(PixelTransform::NonLinear, 1.0));
    }

    let scale = local_scale(&to_dst_crs, src_gbox, dst_gbox, &roi_dst).unwrap_or(1.0);

    Ok(ReprojectRoi {
        roi_src,
        roi_dst,
        transform: PixelTransform::NonLinear,
        scale,
    })
}

/// Estimate source pixels per destination pixel by mapping a one-pixel step
/// at the centre of the destination region into source pixel space.
fn local_scale(
    to_dst_crs: &CrsTransform,
    src_gbox: &GeoBox,
    dst_gbox: &GeoBox,
    roi_dst: &Roi,
) -> Option<f64> {
    let src_inv = src_gbox.transform().inverse().ok()?;
    let (rows, cols) = roi_dst.shape();
    let c0 = roi_dst.col0 as f64 + cols as f64 / 2.0;
    let r0 = roi_dst.row0 as f64 + rows as f64 / 2.0;

    let mut to_src_px = |c: f64, r: f64| -> Option<(f64, f64)> {
        let (x, y) = dst_gbox.to_world(c, r);
        let (x, y) = to_dst_crs.apply_inverse(x, y).ok()?;
        Some(src_inv.apply(x, y))
    };

    let p = to_src_px(c0, r0)?;
    let px = to_src_px(c0 + 1.0, r0)?;
    let py = to_src_px(c0, r0 + 1.0)?;

    let lx = ((px.0 - p.0).powi(2) + (px.1 - p.1).powi(2)).sqrt();
    let ly = ((py.0 - p.0).powi(2) + (py.1 - p.1).powi(2)).sqrt();
    if lx <= 0.0 || ly <= 0.0 {
        return None;
    }
    Some((lx * ly).sqrt())
}
