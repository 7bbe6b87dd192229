//! Point-sampling kernels used by the warp engine.
//!
//! All kernels take corner-based source pixel coordinates (pixel centers at
//! `col + 0.5, row + 0.5`) and return `None` when the sample falls outside
//! the array or would involve a nodata/NaN neighbour, leaving the
//! destination pixel at its fill value.

use ndarray::ArrayView2;
use num_traits::NumCast;

use crate::types::{is_valid, Pixel, Resampling};

/// Dispatch a single sample through the chosen kernel.
pub fn sample<T: Pixel>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    method: Resampling,
    nodata: Option<T>,
) -> Option<T> {
    match method {
        Resampling::Nearest => sample_nearest(src, x, y, nodata),
        Resampling::Bilinear => sample_bilinear(src, x, y, nodata),
        Resampling::Cubic => sample_cubic(src, x, y, nodata),
        Resampling::Average => sample_average(src, x, y, nodata),
    }
}

/// Nearest-neighbour: `floor()` finds the containing pixel.
fn sample_nearest<T: Pixel>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
) -> Option<T> {
    let col = x.floor() as isize;
    let row = y.floor() as isize;

    let (rows, cols) = (src.nrows() as isize, src.ncols() as isize);
    if col < 0 || col >= cols || row < 0 || row >= rows {
        return None;
    }

    let val = src[(row as usize, col as usize)];
    if !is_valid(val, nodata) {
        return None;
    }
    Some(val)
}

/// Bilinear: 2×2 weighted interpolation around the sample point.
fn sample_bilinear<T: Pixel>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
) -> Option<T> {
    let cx = x - 0.5;
    let cy = y - 0.5;

    let x0 = cx.floor() as isize;
    let y0 = cy.floor() as isize;
    let (x1, y1) = (x0 + 1, y0 + 1);

    let (rows, cols) = (src.nrows() as isize, src.ncols() as isize);
    if x0 < 0 || x1 >= cols || y0 < 0 || y1 >= rows {
        // fall back to the containing pixel at the array edge rather than
        // shrinking valid coverage by half a pixel
        return sample_nearest(src, x, y, nodata);
    }

    let v00 = src[(y0 as usize, x0 as usize)];
    let v10 = src[(y0 as usize, x1 as usize)];
    let v01 = src[(y1 as usize, x0 as usize)];
    let v11 = src[(y1 as usize, x1 as usize)];

    if [v00, v10, v01, v11].iter().any(|&v| !is_valid(v, nodata)) {
        return None;
    }

    let f00: f64 = NumCast::from(v00)?;
    let f10: f64 = NumCast::from(v10)?;
    let f01: f64 = NumCast::from(v01)?;
    let f11: f64 = NumCast::from(v11)?;
    if [f00, f10, f01, f11].iter().any(|v| v.is_nan()) {
        return None;
    }

    let dx = cx - x0 as f64;
    let dy = cy - y0 as f64;
    let result = f00 * (1.0 - dx) * (1.0 - dy)
        + f10 * dx * (1.0 - dy)
        + f01 * (1.0 - dx) * dy
        + f11 * dx * dy;

    NumCast::from(result)
}

/// Cubic convolution weight (Keys 1981, a = -0.5).
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (A + 2.0) * t * t * t - (A + 3.0) * t * t + 1.0
    } else if t <= 2.0 {
        A * t * t * t - 5.0 * A * t * t + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}

/// Cubic convolution over a 4×4 neighbourhood.
fn sample_cubic<T: Pixel>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
) -> Option<T> {
    let cx = x - 0.5;
    let cy = y - 0.5;

    let ix = cx.floor() as isize;
    let iy = cy.floor() as isize;

    let (rows, cols) = (src.nrows() as isize, src.ncols() as isize);
    if ix - 1 < 0 || ix + 2 >= cols || iy - 1 < 0 || iy + 2 >= rows {
        return sample_bilinear(src, x, y, nodata);
    }

    let dx = cx - ix as f64;
    let dy = cy - iy as f64;

    let mut acc = 0.0;
    for j in -1..=2_isize {
        let wy = cubic_weight(dy - j as f64);
        for i in -1..=2_isize {
            let wx = cubic_weight(dx - i as f64);
            let val = src[((iy + j) as usize, (ix + i) as usize)];
            if !is_valid(val, nodata) {
                return None;
            }
            let fval: f64 = NumCast::from(val)?;
            if fval.is_nan() {
                return None;
            }
            acc += wx * wy * fval;
        }
    }

    NumCast::from(acc)
}

/// Mean of the valid pixels in the 2×2 neighbourhood; `None` only when all
/// four are invalid.
fn sample_average<T: Pixel>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
) -> Option<T> {
    let cx = x - 0.5;
    let cy = y - 0.5;

    let x0 = cx.floor() as isize;
    let y0 = cy.floor() as isize;

    let (rows, cols) = (src.nrows() as isize, src.ncols() as isize);
    let mut acc = 0.0;
    let mut n = 0usize;
    for j in 0..=1_isize {
        for i in 0..=1_isize {
            let (r, c) = (y0 + j, x0 + i);
            if r < 0 || r >= rows || c < 0 || c >= cols {
                continue;
            }
            let val = src[(r as usize, c as usize)];
            if !is_valid(val, nodata) {
                continue;
            }
            let fval: f64 = NumCast::from(val)?;
            if fval.is_nan() {
                continue;
            }
            acc += fval;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    NumCast::from(acc / n as f64)
}
