//! Similarity transform (uniform scale + rotation + translation).
//!
//! The forward map is built around a centre `c`, normally the image
//! midpoint `(W/2, H/2)`:
//!
//! ```text
//! T(p) = s * R(theta) * (p - c) + c + t
//! ```
//!
//! Resampling needs the exact algebraic inverse
//!
//! ```text
//! T^-1(q) = (1/s) * R(-theta) * (q - c - t) + c
//! ```
//!
//! which is what [`SimilarityTransform::inverse_mapping`] returns.

use std::fmt;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use nalgebra::{Matrix2, Matrix3, Point2, Vector2};
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::image::image::center_of;
use super::affine::AffineMapping;
use super::trait_::Transform;

/// The four similarity parameters `(s, theta, tx, ty)`.
///
/// Rotation is in radians; translation is in pixels of whatever resolution
/// the parameters are currently expressed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityParams {
    pub scale: f64,
    pub rotation: f64,
    pub translation_x: f64,
    pub translation_y: f64,
}

impl SimilarityParams {
    /// Number of free parameters.
    pub const COUNT: usize = 4;

    pub const SCALE: usize = 0;
    pub const ROTATION: usize = 1;
    pub const TRANSLATION_X: usize = 2;
    pub const TRANSLATION_Y: usize = 3;

    pub fn new(scale: f64, rotation: f64, translation_x: f64, translation_y: f64) -> Self {
        Self {
            scale,
            rotation,
            translation_x,
            translation_y,
        }
    }

    /// `s = 1, theta = 0, t = (0, 0)`.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Parameters in `[s, theta, tx, ty]` order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.scale, self.rotation, self.translation_x, self.translation_y]
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Check that the parameters describe an invertible transform.
    ///
    /// # Errors
    /// Returns `InvalidTransformParams` if the scale is zero or any
    /// parameter is not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(CoreError::invalid_transform(format!(
                "scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        if !self.rotation.is_finite() {
            return Err(CoreError::invalid_transform(format!(
                "rotation must be finite, got {}",
                self.rotation
            )));
        }
        if !self.translation_x.is_finite() || !self.translation_y.is_finite() {
            return Err(CoreError::invalid_transform(format!(
                "translation must be finite, got ({}, {})",
                self.translation_x, self.translation_y
            )));
        }
        Ok(())
    }

    /// Express the translation at another resolution.
    ///
    /// `ratio` is new pixels per old pixel (2.0 when moving one pyramid
    /// level finer). Scale and rotation are resolution independent.
    pub fn rescale_translation(&self, ratio: f64) -> Self {
        Self::new(
            self.scale,
            self.rotation,
            self.translation_x * ratio,
            self.translation_y * ratio,
        )
    }

    /// Parameters of the inverse transform about the same centre.
    ///
    /// # Errors
    /// Returns `InvalidTransformParams` if `self` is not invertible.
    pub fn inverse(&self) -> Result<Self> {
        self.validate()?;
        let inv_scale = 1.0 / self.scale;
        let t = rotation_matrix(-self.rotation) * Vector2::new(self.translation_x, self.translation_y);
        let inverse = Self::new(inv_scale, -self.rotation, -inv_scale * t.x, -inv_scale * t.y);
        inverse.validate()?;
        Ok(inverse)
    }

    /// Parameters of `self ∘ other` (apply `other` first) about a shared centre.
    pub fn compose(&self, other: &Self) -> Self {
        let t_other = Vector2::new(other.translation_x, other.translation_y);
        let t = rotation_matrix(self.rotation) * t_other * self.scale
            + Vector2::new(self.translation_x, self.translation_y);
        Self::new(
            self.scale * other.scale,
            self.rotation + other.rotation,
            t.x,
            t.y,
        )
    }
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for SimilarityParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s={:.4}, theta={:.4}, tx={:.3}, ty={:.3}",
            self.scale, self.rotation, self.translation_x, self.translation_y
        )
    }
}

fn rotation_matrix(theta: f64) -> Matrix2<f64> {
    let (sin, cos) = theta.sin_cos();
    Matrix2::new(cos, -sin, sin, cos)
}

/// Similarity parameters bound to a rotation/scaling centre.
///
/// Construction validates the parameters, so every method here is
/// infallible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    params: SimilarityParams,
    center: Point2<f64>,
}

impl SimilarityTransform {
    /// # Errors
    /// Returns `InvalidTransformParams` for a zero or non-finite scale.
    pub fn new(params: SimilarityParams, center: Point2<f64>) -> Result<Self> {
        params.validate()?;
        if !center.x.is_finite() || !center.y.is_finite() {
            return Err(CoreError::invalid_transform("centre must be finite"));
        }
        Ok(Self { params, center })
    }

    /// Transform centred on the midpoint of an `[H, W]` image.
    pub fn centered(params: SimilarityParams, shape: [usize; 2]) -> Result<Self> {
        Self::new(params, center_of(shape))
    }

    pub fn params(&self) -> &SimilarityParams {
        &self.params
    }

    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    /// `s * R(theta)`
    pub fn linear_part(&self) -> Matrix2<f64> {
        rotation_matrix(self.params.rotation) * self.params.scale
    }

    /// Homogeneous forward matrix: `T(c) * [sR 0; 0 1] * T(-c)`, plus `t`.
    pub fn forward_matrix(&self) -> Matrix3<f64> {
        let a = self.linear_part();
        let c = self.center.coords;
        let t = Vector2::new(self.params.translation_x, self.params.translation_y);
        AffineMapping::new(a, c - a * c + t).to_homogeneous()
    }

    /// Exact inverse `(matrix, offset)` pair: `matrix = (1/s) R(-theta)`,
    /// `offset = c - matrix * (c + t)`.
    pub fn inverse_mapping(&self) -> AffineMapping {
        let inv = rotation_matrix(-self.params.rotation) * (1.0 / self.params.scale);
        let c = self.center.coords;
        let t = Vector2::new(self.params.translation_x, self.params.translation_y);
        AffineMapping::new(inv, c - inv * (c + t))
    }

    /// Homogeneous form of [`inverse_mapping`](Self::inverse_mapping).
    pub fn inverse_matrix(&self) -> Matrix3<f64> {
        self.inverse_mapping().to_homogeneous()
    }

    pub fn forward_mapping(&self) -> AffineMapping {
        AffineMapping::from_homogeneous(&self.forward_matrix())
    }

    pub fn transform_point(&self, point: &Point2<f64>) -> Point2<f64> {
        self.forward_mapping().apply(point)
    }

    pub fn inverse_transform_point(&self, point: &Point2<f64>) -> Point2<f64> {
        self.inverse_mapping().apply(point)
    }

    /// The inverse similarity about the same centre.
    pub fn inverse(&self) -> Result<Self> {
        Self::new(self.params.inverse()?, self.center)
    }
}

impl<B: Backend> Transform<B> for SimilarityTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward_mapping().transform_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_inverse_is_exact() {
        let transform = SimilarityTransform::centered(SimilarityParams::identity(), [64, 64]).unwrap();
        let mapping = transform.inverse_mapping();
        assert_eq!(mapping.matrix(), &Matrix2::identity());
        assert_eq!(mapping.offset(), &Vector2::zeros());
    }

    #[test]
    fn test_quarter_turn_about_center() {
        let params = SimilarityParams::new(1.0, FRAC_PI_2, 1.0, 2.0);
        let transform = SimilarityTransform::new(params, Point2::new(10.0, 10.0)).unwrap();

        // (11, 10) is one pixel right of centre; a quarter turn moves it one pixel down.
        let p = transform.transform_point(&Point2::new(11.0, 10.0));
        assert!((p.x - 11.0).abs() < 1e-12);
        assert!((p.y - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_about_center() {
        let params = SimilarityParams::new(2.0, 0.0, 0.0, 0.0);
        let transform = SimilarityTransform::centered(params, [20, 40]).unwrap();
        let c = *transform.center();
        assert_eq!(transform.transform_point(&c), c);

        let p = transform.transform_point(&Point2::new(25.0, 10.0));
        assert!((p.x - 30.0).abs() < 1e-12);
        assert!((p.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrices_are_inverses() {
        let params = SimilarityParams::new(1.3, -0.7, 4.5, -2.25);
        let transform = SimilarityTransform::centered(params, [48, 64]).unwrap();
        let product = transform.forward_matrix() * transform.inverse_matrix();
        assert!((product - Matrix3::identity()).abs().max() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_scale() {
        for scale in [0.0, f64::NAN, f64::INFINITY] {
            let params = SimilarityParams::new(scale, 0.0, 0.0, 0.0);
            let err = SimilarityTransform::centered(params, [8, 8]).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransformParams(_)));
        }
    }

    #[test]
    fn test_param_inverse_composes_to_identity() {
        let params = SimilarityParams::new(1.1, 0.1, 3.0, -2.0);
        let inverse = params.inverse().unwrap();
        let composed = params.compose(&inverse);

        assert!((composed.scale - 1.0).abs() < 1e-12);
        assert!(composed.rotation.abs() < 1e-12);
        assert!(composed.translation_x.abs() < 1e-12);
        assert!(composed.translation_y.abs() < 1e-12);
    }

    #[test]
    fn test_param_inverse_matches_matrix_inverse() {
        let params = SimilarityParams::new(0.8, 0.4, -1.5, 6.0);
        let transform = SimilarityTransform::centered(params, [32, 32]).unwrap();
        let inverse = transform.inverse().unwrap();
        let diff = inverse.forward_matrix() - transform.inverse_matrix();
        assert!(diff.abs().max() < 1e-12);
    }

    #[test]
    fn test_rescale_translation_keeps_scale_and_rotation() {
        let params = SimilarityParams::new(1.2, 0.3, 1.5, -0.5).rescale_translation(2.0);
        assert_eq!(params, SimilarityParams::new(1.2, 0.3, 3.0, -1.0));
    }

    #[test]
    fn test_array_order() {
        let params = SimilarityParams::from_array([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(params.rotation, 2.0);
        assert_eq!(params.to_array()[SimilarityParams::TRANSLATION_Y], 4.0);
    }
}
