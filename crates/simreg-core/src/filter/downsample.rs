use burn::tensor::{Int, Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::image::Image;

/// Downsample filter.
///
/// Reduces the image size by an integer factor by keeping every Nth pixel
/// along each axis (pixel `i` of the output is pixel `factor * i` of the
/// input), so an axis of length `n` becomes `ceil(n / factor)`. Updates
/// spacing to reflect the new resolution. Smooth first to avoid aliasing.
pub struct DownsampleFilter<B: Backend> {
    factor: usize,
    _b: std::marker::PhantomData<B>,
}

impl<B: Backend> DownsampleFilter<B> {
    /// Create a new downsample filter; factors below 1 are treated as 1.
    pub fn new(factor: usize) -> Self {
        Self {
            factor: factor.max(1),
            _b: std::marker::PhantomData,
        }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Output shape for an `[H, W]` input.
    pub fn output_shape(&self, shape: [usize; 2]) -> [usize; 2] {
        [shape[0].div_ceil(self.factor), shape[1].div_ceil(self.factor)]
    }

    /// Apply the filter to an image.
    pub fn apply(&self, image: &Image<B>) -> Image<B> {
        if self.factor == 1 {
            return image.clone();
        }

        let mut data = image.data().clone();
        let device = data.device();
        let dims = image.shape();

        for (d, &size) in dims.iter().enumerate() {
            let indices_vec: Vec<i64> = (0..size).step_by(self.factor).map(|x| x as i64).collect();
            let count = indices_vec.len();
            let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices_vec, [count]), &device);
            data = data.select(d, indices);
        }

        Image::new(data).with_spacing(image.spacing() * self.factor as f64)
    }
}
