//! Paste-eligibility classification.
//!
//! Decides whether an overlap can be serviced by a direct (optionally
//! flipped, optionally integer-decimated) pixel copy, or whether a real
//! resampling warp is needed. All failures here are routing decisions,
//! never errors.

use crate::core::reproject_roi::ReprojectRoi;
use crate::geometry::Affine;

/// Default tolerance on scale factors (fraction of a pixel).
pub const SCALE_TOL: f64 = 1e-3;

/// Default tolerance on sub-pixel translation for interpolating kernels.
pub const TRANSLATION_TOL: f64 = 1e-2;

/// Sub-pixel translation tolerance for nearest-neighbour resampling.
///
/// Nearest-neighbour picks the same pixels for anything under half a pixel
/// of misalignment, so paste stays safe (and much cheaper) far beyond the
/// interpolating-kernel threshold. Policy knob, not a derived constant.
pub const TRANSLATION_TOL_NN: f64 = 0.9;

pub(crate) fn is_almost_int(x: f64, tol: f64) -> bool {
    (x - x.round()).abs() < tol
}

/// Check whether the overlap described by `rr` can be read-and-pasted.
///
/// Returns `Ok(())` when a plain (strided) copy is legal, or the reason the
/// first check failed. Checks run in order and short-circuit.
pub fn can_paste(rr: &ReprojectRoi, stol: f64, ttol: f64) -> Result<(), &'static str> {
    let affine = match rr.transform.linear() {
        Some(a) if rr.is_st() => a,
        _ => return Err("not a scale+translate transform"),
    };

    if !is_almost_int(rr.scale, stol) {
        return Err("non-integer scale");
    }
    let scale = rr.scale.round();

    // compose with the decimation: overview pixel -> dst pixel should be
    // one-to-one up to sign
    let a = affine * Affine::scale(scale, scale);
    let (sx, sy, tx, ty) = (a.a, a.e, a.c, a.f);

    if (sx.abs() - 1.0).abs() > stol || (sy.abs() - 1.0).abs() > stol {
        return Err("anisotropic scale");
    }

    // a source region of e.g. 3x7 cannot be decimated by 2 without
    // resampling across block boundaries
    let (src_rows, src_cols) = rr.roi_src.shape();
    let ny = src_rows as f64 / scale;
    let nx = src_cols as f64 / scale;
    if !is_almost_int(ny, stol) || !is_almost_int(nx, stol) {
        return Err("source region not aligned to decimation blocks");
    }

    if (ny.round() as usize, nx.round() as usize) != rr.roi_dst.shape() {
        return Err("decimated source shape != destination shape");
    }

    // translation is in destination pixels; anything beyond the tolerance
    // would displace the pasted block visibly
    if !is_almost_int(tx, ttol) || !is_almost_int(ty, ttol) {
        return Err("sub-pixel translation");
    }

    Ok(())
}
