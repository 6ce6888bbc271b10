//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

/// What an interpolator returns for coordinates outside the image.
///
/// A coordinate `(x, y)` is inside an `[H, W]` image when
/// `0 <= x <= W - 1` and `0 <= y <= H - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BorderMode {
    /// Every outside coordinate samples the given constant.
    Constant(f64),
    /// Outside coordinates sample the nearest edge pixel.
    Clamp,
}

impl Default for BorderMode {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

/// Interpolator trait for sampling values at continuous coordinates.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate values from an image tensor at continuous pixel coordinates.
    ///
    /// # Arguments
    /// * `data` - The source image `[H, W]`
    /// * `indices` - The `(x, y)` coordinates to sample `[Batch, 2]`
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch]`
    fn interpolate(&self, data: &Tensor<B, 2>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
