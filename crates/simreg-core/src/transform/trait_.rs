//! Transform trait for spatial coordinate transformations.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Maps batches of 2D points from one pixel space to another.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Transform<B: Backend> {
    /// Apply transform to a batch of points.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, 2]` holding `(x, y)` rows
    ///
    /// # Returns
    /// Tensor of shape `[Batch, 2]` containing the transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
