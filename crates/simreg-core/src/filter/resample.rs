//! Resample image filter.
//!
//! The transform handed to the resampler maps *output* pixel coordinates to
//! *input* pixel coordinates, i.e. it is the inverse of the transform that
//! moves the input onto the output grid.

use std::marker::PhantomData;
use burn::tensor::backend::Backend;
use nalgebra::{Matrix2, Vector2};
use crate::error::{CoreError, Result};
use crate::image::{generate_grid_2d, Image};
use crate::interpolation::{BorderMode, Interpolator, LinearInterpolator};
use crate::transform::{AffineMapping, SimilarityParams, SimilarityTransform, Transform};

/// Resample image filter.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - Transform from output space to input space
/// * `I` - The interpolator type
pub struct ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    size: [usize; 2],
    spacing: f64,
    transform: T,
    interpolator: I,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    /// Create a new resample filter producing an image of `size` (`[H, W]`).
    pub fn new(size: [usize; 2], transform: T, interpolator: I) -> Self {
        Self {
            size,
            spacing: 1.0,
            transform,
            interpolator,
            _phantom: PhantomData,
        }
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image<B>) -> Image<B> {
        let device = input.device();

        let output_points = generate_grid_2d::<B>(self.size, &device);
        let input_points = self.transform.transform_points(output_points);
        let output_flat = self.interpolator.interpolate(input.data(), input_points);

        Image::new(output_flat.reshape(self.size)).with_spacing(self.spacing)
    }
}

/// Resample `source` onto an `output_shape` grid through an inverse mapping.
///
/// Every output pixel `p` takes the bilinear sample of `source` at
/// `mapping(p)`; samples outside the source take `fill_value`. The output
/// inherits the source spacing.
pub fn resample<B: Backend>(
    source: &Image<B>,
    mapping: &AffineMapping,
    output_shape: [usize; 2],
    fill_value: f64,
) -> Image<B> {
    let interpolator = LinearInterpolator::new().with_border(BorderMode::Constant(fill_value));
    ResampleImageFilter::new(output_shape, *mapping, interpolator)
        .with_spacing(source.spacing())
        .apply(source)
}

/// Move `source` by the similarity `params` onto an `output_shape` grid.
///
/// The transform is centred on the output grid's midpoint.
///
/// # Errors
/// Returns `InvalidTransformParams` if `params` cannot be inverted.
pub fn warp<B: Backend>(
    source: &Image<B>,
    params: &SimilarityParams,
    output_shape: [usize; 2],
    fill_value: f64,
) -> Result<Image<B>> {
    let transform = SimilarityTransform::centered(*params, output_shape)?;
    Ok(resample(source, &transform.inverse_mapping(), output_shape, fill_value))
}

/// Bilinear resize to `shape` with corner pixels aligned.
///
/// Every output sample falls inside the source, so no border policy applies.
///
/// # Errors
/// Returns `InvalidArgument` if `shape` has a zero dimension.
pub fn resize<B: Backend>(source: &Image<B>, shape: [usize; 2]) -> Result<Image<B>> {
    let [out_h, out_w] = shape;
    if out_h == 0 || out_w == 0 {
        return Err(CoreError::invalid_argument(format!(
            "resize target must be non-zero, got {}x{}",
            out_h, out_w
        )));
    }
    if shape == source.shape() {
        return Ok(source.clone());
    }

    let [in_h, in_w] = source.shape();
    let ratio = |inp: usize, out: usize| {
        if out > 1 {
            (inp - 1) as f64 / (out - 1) as f64
        } else {
            0.0
        }
    };
    let mapping = AffineMapping::new(
        Matrix2::new(ratio(in_w, out_w), 0.0, 0.0, ratio(in_h, out_h)),
        Vector2::zeros(),
    );

    let interpolator = LinearInterpolator::new().with_border(BorderMode::Clamp);
    Ok(ResampleImageFilter::new(shape, mapping, interpolator).apply(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::phantom;

    type B = NdArray<f64>;

    #[test]
    fn test_identity_resample_is_exact() {
        let device = Default::default();
        let image = phantom::rectangle::<B>([16, 20], 4.0, &device);
        let mapping = SimilarityTransform::centered(SimilarityParams::identity(), image.shape())
            .unwrap()
            .inverse_mapping();

        let out = resample(&image, &mapping, image.shape(), 0.0);
        assert_eq!(out.to_vec(), image.to_vec());
    }

    #[test]
    fn test_integer_translation_shifts_pixels() {
        let device = Default::default();
        let values: Vec<f64> = (0..25).map(|v| v as f64).collect();
        let image = Image::<B>::from_vec(values, [5, 5], &device).unwrap();

        // Move the content one pixel right and two down.
        let params = SimilarityParams::new(1.0, 0.0, 1.0, 2.0);
        let out = warp(&image, &params, [5, 5], -1.0).unwrap().to_vec();

        // out(x, y) = in(x - 1, y - 2)
        assert_eq!(out[2 * 5 + 1], 0.0);
        assert_eq!(out[4 * 5 + 4], 13.0);
        // Column 0 and rows 0..2 sample outside the source.
        assert_eq!(out[0], -1.0);
        assert_eq!(out[3 * 5], -1.0);
    }

    #[test]
    fn test_warp_rejects_zero_scale() {
        let device = Default::default();
        let image = Image::<B>::filled([4, 4], 1.0, &device);
        let params = SimilarityParams::new(0.0, 0.0, 0.0, 0.0);
        let err = warp(&image, &params, [4, 4], 0.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransformParams(_)));
    }

    #[test]
    fn test_resize_aligns_corners() {
        let device = Default::default();
        let image = Image::<B>::from_vec(vec![0.0, 1.0, 2.0, 3.0], [2, 2], &device).unwrap();
        let out = resize(&image, [3, 3]).unwrap().to_vec();

        assert_eq!(out[0], 0.0);
        assert_eq!(out[2], 1.0);
        assert_eq!(out[6], 2.0);
        assert_eq!(out[8], 3.0);
        assert!((out[4] - 1.5).abs() < 1e-12);
    }
}
