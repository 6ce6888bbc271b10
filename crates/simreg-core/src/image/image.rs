//! Intensity image backed by a burn tensor.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use nalgebra::Point2;
use crate::error::{CoreError, Result};

/// 2D grid of scalar intensities.
///
/// The data tensor has shape `[H, W]` (row-major, `y` then `x`). Intensities
/// are expected to be normalized (typically to `[0, 1]`) by whoever loads the
/// image; this type only guarantees the grid is non-empty and finite when
/// built through [`Image::from_vec`].
///
/// `spacing` is the size of one pixel measured in pixels of the input
/// full-resolution image. It is `1.0` for input images and doubles at every
/// pyramid level, so the ratio of two spacings is the factor by which
/// translations must be rescaled when moving between levels.
///
/// # Examples
/// ```rust
/// use simreg_core::Image;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f64>;
///
/// let device = Default::default();
/// let image = Image::<Backend>::from_vec(vec![0.0; 12], [3, 4], &device).unwrap();
/// assert_eq!(image.shape(), [3, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend> {
    data: Tensor<B, 2>,
    spacing: f64,
}

impl<B: Backend> Image<B> {
    /// Wrap an existing `[H, W]` tensor with unit spacing.
    pub fn new(data: Tensor<B, 2>) -> Self {
        Self { data, spacing: 1.0 }
    }

    /// Build an image from row-major intensities.
    ///
    /// # Errors
    /// Returns `InvalidImage` if the shape has a zero dimension, if the
    /// number of values does not match the shape, or if any value is not
    /// finite.
    pub fn from_vec(values: Vec<f64>, shape: [usize; 2], device: &B::Device) -> Result<Self> {
        let [h, w] = shape;
        if h == 0 || w == 0 {
            return Err(CoreError::invalid_image(format!(
                "image dimensions must be non-zero, got {}x{}",
                h, w
            )));
        }
        if values.len() != h * w {
            return Err(CoreError::invalid_image(format!(
                "expected {} values for a {}x{} image, got {}",
                h * w,
                h,
                w,
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::invalid_image(format!(
                "non-finite intensity at pixel ({}, {})",
                pos % w,
                pos / w
            )));
        }

        let data = Tensor::<B, 2>::from_data(TensorData::new(values, shape), device);
        Ok(Self::new(data))
    }

    /// Image of the given shape filled with `value`.
    pub fn filled(shape: [usize; 2], value: f64, device: &B::Device) -> Self {
        Self::new(Tensor::<B, 2>::full(shape, value, device))
    }

    /// Set the pixel spacing relative to full resolution.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Get the image data tensor.
    pub fn data(&self) -> &Tensor<B, 2> {
        &self.data
    }

    /// Consume the image and return its data tensor.
    pub fn into_data(self) -> Tensor<B, 2> {
        self.data
    }

    /// Pixel spacing relative to the full-resolution image.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Image shape as `[H, W]`.
    pub fn shape(&self) -> [usize; 2] {
        self.data.dims()
    }

    pub fn height(&self) -> usize {
        self.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.shape()[1]
    }

    /// Device holding the pixel data.
    pub fn device(&self) -> B::Device {
        self.data.device()
    }

    /// Rotation/scaling centre `(W/2, H/2)` in pixel coordinates.
    pub fn center(&self) -> Point2<f64> {
        center_of(self.shape())
    }

    /// Copy the intensities to the host in row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone().into_data().iter::<f64>().collect()
    }
}

/// Centre `(W/2, H/2)` of an `[H, W]` grid.
pub fn center_of(shape: [usize; 2]) -> Point2<f64> {
    Point2::new(shape[1] as f64 / 2.0, shape[0] as f64 / 2.0)
}
