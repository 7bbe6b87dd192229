//! 2D affine geotransforms.
//!
//! Maps pixel coordinates (col, row) to projected coordinates (x, y):
//!   x = a * col + b * row + c
//!   y = d * col + e * row + f
//!
//! Pixel (0, 0) has its upper-left corner at pixel coordinate (0.0, 0.0)
//! and its center at (0.5, 0.5).

use serde::{Deserialize, Serialize};

use crate::types::{RasterError, RasterResult};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Pure scaling transform.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Pure translation transform.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    /// Create from a GDAL-style geotransform array [c, a, b, f, d, e].
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            a: gt[1],
            b: gt[2],
            c: gt[0],
            d: gt[4],
            e: gt[5],
            f: gt[3],
        }
    }

    /// Convert to a GDAL-style geotransform array [c, a, b, f, d, e].
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Apply the forward transform: (col, row) -> (x, y).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.a * col + self.b * row + self.c;
        let y = self.d * col + self.e * row + self.f;
        (x, y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Compute the inverse affine transform.
    pub fn inverse(&self) -> RasterResult<Affine> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return Err(RasterError::InvalidTransform(
                "singular affine transform (determinant is zero)".into(),
            ));
        }
        let inv_det = 1.0 / det;
        Ok(Affine {
            a: self.e * inv_det,
            b: -self.b * inv_det,
            c: (self.b * self.f - self.e * self.c) * inv_det,
            d: -self.d * inv_det,
            e: self.a * inv_det,
            f: (self.d * self.c - self.a * self.f) * inv_det,
        })
    }

    /// No rotation/shear component: the transform is pure scale + translation.
    pub fn is_scale_translate(&self, tol: f64) -> bool {
        self.b.abs() < tol && self.d.abs() < tol
    }
}

/// Composition: `(lhs * rhs).apply(p) == lhs.apply(rhs.apply(p))`.
impl std::ops::Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        Affine {
            a: self.a * rhs.a + self.b * rhs.d,
            b: self.a * rhs.b + self.b * rhs.e,
            c: self.a * rhs.c + self.b * rhs.f + self.c,
            d: self.d * rhs.a + self.e * rhs.d,
            e: self.d * rhs.b + self.e * rhs.e,
            f: self.d * rhs.c + self.e * rhs.f + self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_apply_identity() {
        let aff = Affine::identity();
        let (x, y) = aff.apply(5.0, 10.0);
        assert_relative_eq!(x, 5.0);
        assert_relative_eq!(y, 10.0);
    }

    #[test]
    fn test_apply_with_offset_and_scale() {
        // 10m resolution, top-left at (500000, 6000000), north-up
        let aff = Affine::new(10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0);
        let (x, y) = aff.apply(0.0, 0.0);
        assert_relative_eq!(x, 500000.0);
        assert_relative_eq!(y, 6000000.0);

        let (x, y) = aff.apply(100.0, 100.0);
        assert_relative_eq!(x, 501000.0);
        assert_relative_eq!(y, 5999000.0);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let aff = Affine::new(10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0);
        let inv = aff.inverse().unwrap();
        let (col, row) = inv.apply(501000.0, 5999000.0);
        assert_relative_eq!(col, 100.0, epsilon = 1e-10);
        assert_relative_eq!(row, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_singular_affine() {
        let aff = Affine::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(aff.inverse().is_err());
    }

    #[test]
    fn test_composition() {
        let a = Affine::scale(2.0, 2.0);
        let b = Affine::translation(3.0, -1.0);
        // scale after translate: (1, 1) -> (4, 0) -> (8, 0)
        let (x, y) = (a * b).apply(1.0, 1.0);
        assert_relative_eq!(x, 8.0);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let aff = Affine::new(25.0, 0.0, 1200.0, 0.0, -25.0, 7000.0);
        let ident = aff * aff.inverse().unwrap();
        assert_relative_eq!(ident.a, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ident.e, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ident.c, 0.0, epsilon = 1e-9);
        assert_relative_eq!(ident.f, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_is_scale_translate() {
        assert!(Affine::new(10.0, 0.0, 5.0, 0.0, -10.0, 8.0).is_scale_translate(1e-10));
        // 15 degree rotation
        let (s, c) = 15f64.to_radians().sin_cos();
        assert!(!Affine::new(c, -s, 0.0, s, c, 0.0).is_scale_translate(1e-10));
    }

    #[test]
    fn test_gdal_roundtrip() {
        let gt = [500000.0, 10.0, 0.0, 6000000.0, 0.0, -10.0];
        let aff = Affine::from_gdal(&gt);
        let gt2 = aff.to_gdal();
        for (a, b) in gt.iter().zip(gt2.iter()) {
            assert_relative_eq!(a, b);
        }
    }
}
