//! Metric trait for image similarity measurement.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use simreg_core::Image;
use simreg_core::transform::Transform;

/// Metric trait for measuring dissimilarity between images.
///
/// Lower values indicate better alignment.
pub trait Metric<B: Backend> {
    /// Calculate the loss between the fixed image and the moving image
    /// sampled through `transform`.
    ///
    /// # Arguments
    /// * `fixed` - The fixed (reference) image
    /// * `moving` - The moving image
    /// * `transform` - Maps fixed pixel coordinates to moving pixel coordinates
    ///
    /// # Returns
    /// Single-element tensor holding the loss
    fn forward(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        transform: &impl Transform<B>,
    ) -> Tensor<B, 1>;
}
