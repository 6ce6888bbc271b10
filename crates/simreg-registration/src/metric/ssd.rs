//! Sum of squared differences metric.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};
use simreg_core::{Image, SimilarityParams, SimilarityTransform};
use simreg_core::image::generate_grid_2d;
use simreg_core::interpolation::{Interpolator, LinearInterpolator};
use simreg_core::transform::Transform;
use crate::error::Result;
use crate::validation;
use super::trait_::Metric;

/// Sum of squared differences.
///
/// SSD = sum((Fixed(x) - Moving(T^-1(x)))^2)
///
/// The moving image is sampled on the fixed image's grid; samples that
/// land outside the moving image take the fill value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SumOfSquaredDifferences {
    interpolator: LinearInterpolator,
}

impl SumOfSquaredDifferences {
    /// Create a new SSD metric with a zero fill value.
    pub fn new() -> Self {
        Self {
            interpolator: LinearInterpolator::new(),
        }
    }

    pub fn with_fill_value(mut self, value: f64) -> Self {
        self.interpolator = self.interpolator.with_fill_value(value);
        self
    }

    /// Cost of moving `moving` by `params` onto `fixed`.
    ///
    /// The similarity is centred on the fixed image's midpoint.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the images differ in shape
    /// * `Core(InvalidTransformParams)` if `params` is not invertible
    /// * `NumericalInstability` if the cost is not finite
    pub fn evaluate<B: Backend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        params: &SimilarityParams,
    ) -> Result<f64> {
        validation::validate_image_shapes(fixed, moving)?;
        let mapping = SimilarityTransform::centered(*params, fixed.shape())?.inverse_mapping();

        let cost = self
            .forward(fixed, moving, &mapping)
            .into_scalar()
            .elem::<f64>();
        validation::validate_finite(cost, "SSD cost")?;
        Ok(cost)
    }
}

impl Default for SumOfSquaredDifferences {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Metric<B> for SumOfSquaredDifferences {
    fn forward(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        transform: &impl Transform<B>,
    ) -> Tensor<B, 1> {
        let device = fixed.device();
        let fixed_points = generate_grid_2d::<B>(fixed.shape(), &device);
        let moving_points = transform.transform_points(fixed_points);
        let moving_values = self.interpolator.interpolate(moving.data(), moving_points);

        let [h, w] = fixed.shape();
        let fixed_values = fixed.data().clone().reshape([h * w]);
        (fixed_values - moving_values).powf_scalar(2.0).sum()
    }
}
