use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use burn::tensor::ops::ConvOptions;
use crate::image::Image;

/// Gaussian smoothing filter.
///
/// Separable 1D convolutions along x then y with zero padding, so the output
/// has the input's shape. Used as the anti-aliasing step before decimation.
pub struct GaussianFilter<B: Backend> {
    sigma: f64,
    max_kernel_width: usize,
    _b: std::marker::PhantomData<B>,
}

impl<B: Backend> GaussianFilter<B> {
    /// Create a new Gaussian filter with the given standard deviation in pixels.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            max_kernel_width: 32,
            _b: std::marker::PhantomData,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Apply the filter to an image, keeping its spacing.
    pub fn apply(&self, image: &Image<B>) -> Image<B> {
        let data = self.apply_tensor(image.data().clone());
        Image::new(data).with_spacing(image.spacing())
    }

    /// Apply the filter to an `[H, W]` tensor directly.
    pub fn apply_tensor(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        if self.sigma <= 1e-6 {
            return input;
        }

        let radius = (3.0 * self.sigma).ceil() as usize;
        let width = (2 * radius + 1).min(self.max_kernel_width);
        let actual_radius = (width - 1) / 2;

        let kernel = self.generate_kernel(actual_radius);
        let kernel_tensor =
            Tensor::<B, 1>::from_data(TensorData::new(kernel, [width]), &input.device());

        // Rows, then columns via a transpose.
        let smoothed_x = Self::convolve_rows(input, kernel_tensor.clone());
        Self::convolve_rows(smoothed_x.transpose(), kernel_tensor).transpose()
    }

    fn generate_kernel(&self, radius: usize) -> Vec<f64> {
        let two_sigma2 = 2.0 * self.sigma * self.sigma;
        let mut kernel: Vec<f64> = (0..=(2 * radius))
            .map(|i| {
                let x = (i as f64) - (radius as f64);
                (-x * x / two_sigma2).exp()
            })
            .collect();

        let sum: f64 = kernel.iter().sum();
        for val in &mut kernel {
            *val /= sum;
        }
        kernel
    }

    /// Convolve every row of `[Rows, Length]` with an odd-length kernel.
    fn convolve_rows(input: Tensor<B, 2>, kernel: Tensor<B, 1>) -> Tensor<B, 2> {
        let [rows, length] = input.dims();
        let kernel_size = kernel.dims()[0];

        // conv1d wants [Batch, Channels=1, Length] and [Out=1, In=1, K]
        let input_reshaped = input.reshape([rows, 1, length]);
        let kernel_reshaped = kernel.reshape([1, 1, kernel_size]);

        let padding = kernel_size / 2;
        let options = ConvOptions::new([1], [padding], [1], 1);
        let output = burn::tensor::module::conv1d(input_reshaped, kernel_reshaped, None, options);

        output.reshape([rows, length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f64>;

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let filter = GaussianFilter::<B>::new(1.0);
        let kernel = filter.generate_kernel(3);
        assert_eq!(kernel.len(), 7);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((kernel[0] - kernel[6]).abs() < 1e-15);
        assert!(kernel[3] > kernel[2]);
    }

    #[test]
    fn test_preserves_shape_and_interior_constant() {
        let device = Default::default();
        let image = Image::<B>::filled([12, 9], 0.5, &device);
        let smoothed = GaussianFilter::new(1.0).apply(&image);
        assert_eq!(smoothed.shape(), [12, 9]);

        // Away from the zero-padded border a constant image stays constant.
        let values = smoothed.to_vec();
        assert!((values[6 * 9 + 4] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let device = Default::default();
        let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let image = Image::<B>::from_vec(values.clone(), [4, 4], &device).unwrap();
        assert_eq!(GaussianFilter::new(0.0).apply(&image).to_vec(), values);
    }
}
