//! Linear-plus-offset point mapping.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use nalgebra::{Matrix2, Matrix3, Point2, Vector2};
use super::trait_::Transform;

/// Point mapping `p -> matrix * p + offset`.
///
/// The resampler receives one of these describing the *inverse* of the
/// registration transform: it maps output pixel coordinates to the source
/// coordinates to sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMapping {
    matrix: Matrix2<f64>,
    offset: Vector2<f64>,
}

impl AffineMapping {
    pub fn new(matrix: Matrix2<f64>, offset: Vector2<f64>) -> Self {
        Self { matrix, offset }
    }

    /// Split a homogeneous 3x3 matrix into its linear part and offset.
    pub fn from_homogeneous(m: &Matrix3<f64>) -> Self {
        Self::new(
            Matrix2::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]),
            Vector2::new(m[(0, 2)], m[(1, 2)]),
        )
    }

    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.matrix
    }

    pub fn offset(&self) -> &Vector2<f64> {
        &self.offset
    }

    pub fn to_homogeneous(&self) -> Matrix3<f64> {
        let m = &self.matrix;
        let o = &self.offset;
        Matrix3::new(
            m[(0, 0)], m[(0, 1)], o.x,
            m[(1, 0)], m[(1, 1)], o.y,
            0.0, 0.0, 1.0,
        )
    }

    pub fn apply(&self, point: &Point2<f64>) -> Point2<f64> {
        Point2::from(self.matrix * point.coords + self.offset)
    }
}

impl<B: Backend> Transform<B> for AffineMapping {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row-vector form: q = p @ M^T + o
        let device = points.device();
        let m = &self.matrix;
        let m_t = Tensor::<B, 2>::from_data(
            TensorData::new(vec![m[(0, 0)], m[(1, 0)], m[(0, 1)], m[(1, 1)]], [2, 2]),
            &device,
        );
        let offset = Tensor::<B, 2>::from_data(
            TensorData::new(vec![self.offset.x, self.offset.y], [1, 2]),
            &device,
        );

        points.matmul(m_t) + offset
    }
}
