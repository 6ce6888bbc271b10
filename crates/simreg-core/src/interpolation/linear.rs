//! Bilinear interpolation.

use burn::tensor::{Tensor, Int};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use super::trait_::{BorderMode, Interpolator};

/// Bilinear interpolator.
///
/// Samples are weighted averages of the four surrounding pixels. At integer
/// coordinates the neighbour weights are exactly zero, so the sampled value
/// is the pixel value itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearInterpolator {
    border: BorderMode,
}

impl LinearInterpolator {
    /// Create a new linear interpolator with a constant `0.0` border.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_border(mut self, border: BorderMode) -> Self {
        self.border = border;
        self
    }

    /// Shorthand for a constant border of `value`.
    pub fn with_fill_value(self, value: f64) -> Self {
        self.with_border(BorderMode::Constant(value))
    }

    pub fn border(&self) -> BorderMode {
        self.border
    }

    #[inline]
    fn gather_2d<B: Backend>(
        flat_data: &Tensor<B, 1>,
        xi: &Tensor<B, 1, Int>,
        yi: &Tensor<B, 1, Int>,
        stride_y: i32,
    ) -> Tensor<B, 1> {
        let idx = yi.clone() * stride_y + xi.clone();
        flat_data.clone().gather(0, idx)
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(&self, data: &Tensor<B, 2>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [height, width] = data.dims();
        let max_x = (width - 1) as f64;
        let max_y = (height - 1) as f64;

        let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = indices.narrow(1, 1, 1).squeeze::<1>(1);

        // 1.0 where the sample lies inside the image, 0.0 outside
        let inside = match self.border {
            BorderMode::Constant(_) => Some(
                x.clone().greater_equal_elem(0.0).float()
                    * x.clone().lower_equal_elem(max_x).float()
                    * y.clone().greater_equal_elem(0.0).float()
                    * y.clone().lower_equal_elem(max_y).float(),
            ),
            BorderMode::Clamp => None,
        };

        // Clamping the coordinates first keeps the Clamp border continuous;
        // in Constant mode the clamped samples are masked out below.
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.clone().floor();
        let y0 = y.clone().floor();

        let wx = x - x0.clone();
        let wy = y - y0.clone();

        let x0_i = x0.clone().int();
        let y0_i = y0.clone().int();
        let x1_i = (x0 + 1.0).clamp(0.0, max_x).int();
        let y1_i = (y0 + 1.0).clamp(0.0, max_y).int();

        let stride_y = width as i32;
        let flat_data = data.clone().reshape([height * width]);

        let v00 = Self::gather_2d(&flat_data, &x0_i, &y0_i, stride_y);
        let v01 = Self::gather_2d(&flat_data, &x0_i, &y1_i, stride_y);
        let v10 = Self::gather_2d(&flat_data, &x1_i, &y0_i, stride_y);
        let v11 = Self::gather_2d(&flat_data, &x1_i, &y1_i, stride_y);

        let one_minus_wx = wx.clone().neg() + 1.0;
        let one_minus_wy = wy.clone().neg() + 1.0;

        let c0 = v00 * one_minus_wx.clone() + v10 * wx.clone();
        let c1 = v01 * one_minus_wx + v11 * wx;
        let values = c0 * one_minus_wy + c1 * wy;

        match (self.border, inside) {
            (BorderMode::Constant(fill), Some(inside)) => {
                let outside = inside.clone().neg() + 1.0;
                values * inside + outside.mul_scalar(fill)
            }
            _ => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f64>;

    fn sample(interpolator: &LinearInterpolator, data: &Tensor<TestBackend, 2>, points: Vec<f64>) -> Vec<f64> {
        let n = points.len() / 2;
        let device = data.device();
        let indices = Tensor::<TestBackend, 2>::from_data(TensorData::new(points, [n, 2]), &device);
        interpolator.interpolate(data, indices).into_data().iter::<f64>().collect()
    }

    fn grid_2x2() -> Tensor<TestBackend, 2> {
        // Shape [Y=2, X=2]
        Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0, 1.0, 10.0, 11.0], [2, 2]),
            &Default::default(),
        )
    }

    #[test]
    fn test_linear_interpolation_at_grid_points() {
        let data = grid_2x2();
        let values = sample(&LinearInterpolator::new(), &data, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(values, vec![0.0, 1.0, 10.0, 11.0]);
    }

    #[test]
    fn test_linear_interpolator_center() {
        let data = grid_2x2();
        let values = sample(&LinearInterpolator::new(), &data, vec![0.5, 0.5]);
        assert!((values[0] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_weights_per_axis() {
        let data = grid_2x2();
        let values = sample(&LinearInterpolator::new(), &data, vec![0.25, 0.0, 0.0, 0.75]);
        assert!((values[0] - 0.25).abs() < 1e-12);
        assert!((values[1] - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_border() {
        let data = grid_2x2();
        let interpolator = LinearInterpolator::new().with_fill_value(-1.0);
        let values = sample(&interpolator, &data, vec![-0.5, 0.0, 1.0, 1.0001, 5.0, 5.0, 1.0, 1.0]);
        assert_eq!(values, vec![-1.0, -1.0, -1.0, 11.0]);
    }

    #[test]
    fn test_clamp_border() {
        let data = grid_2x2();
        let interpolator = LinearInterpolator::new().with_border(BorderMode::Clamp);
        let values = sample(&interpolator, &data, vec![-1.0, -1.0, 5.0, 5.0, 3.0, 0.5]);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 11.0);
        assert!((values[2] - 6.0).abs() < 1e-12);
    }
}
