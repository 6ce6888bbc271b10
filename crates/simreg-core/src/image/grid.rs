use burn::tensor::{Tensor, TensorData, Shape};
use burn::tensor::backend::Backend;

/// Generate a grid of pixel coordinates for a 2D image shape.
///
/// Returns a tensor of shape `[N, 2]` where N is the total number of pixels.
/// Rows are ordered row-major (`y` outer, `x` inner) so the result lines up
/// with a flattened `[H, W]` image, and each row holds `(x, y)`.
///
/// # Arguments
/// * `shape` - The image shape `[H, W]`
/// * `device` - The device to create the tensor on
pub fn generate_grid_2d<B>(
    shape: [usize; 2],
    device: &B::Device,
) -> Tensor<B, 2>
where
    B: Backend,
{
    let h = shape[0];
    let w = shape[1];
    let total = h * w;

    let mut grid = Vec::with_capacity(total * 2);
    for y in 0..h {
        for x in 0..w {
            grid.push(x as f64);
            grid.push(y as f64);
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * 2])), device)
        .reshape([total, 2])
}
