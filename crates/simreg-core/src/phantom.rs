//! Synthetic test images.
//!
//! All generators return intensities in `[0, 1]` on a zero background.

use burn::tensor::backend::Backend;
use crate::image::Image;

/// Anisotropic Gaussian blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Centre `(x, y)` in pixels.
    pub center: [f64; 2],
    /// Standard deviations along the blob's own axes.
    pub sigma: [f64; 2],
    /// Orientation of the blob's first axis in radians.
    pub angle: f64,
    pub amplitude: f64,
}

fn generate<B: Backend>(
    shape: [usize; 2],
    device: &B::Device,
    f: impl Fn(f64, f64) -> f64,
) -> Image<B> {
    let [h, w] = shape;
    let mut values = Vec::with_capacity(h * w);
    for y in 0..h {
        for x in 0..w {
            values.push(f(x as f64, y as f64).clamp(0.0, 1.0));
        }
    }
    Image::new(burn::tensor::Tensor::from_data(
        burn::tensor::TensorData::new(values, shape),
        device,
    ))
}

/// Filled disk of `radius` pixels centred on `(W/2, H/2)`.
pub fn circle<B: Backend>(shape: [usize; 2], radius: f64, device: &B::Device) -> Image<B> {
    let cx = shape[1] as f64 / 2.0;
    let cy = shape[0] as f64 / 2.0;
    let r2 = radius * radius;
    generate(shape, device, |x, y| {
        let d2 = (x - cx).powi(2) + (y - cy).powi(2);
        if d2 <= r2 { 1.0 } else { 0.0 }
    })
}

/// Filled square of half-width `half_size` centred on `(W/2, H/2)`.
pub fn rectangle<B: Backend>(shape: [usize; 2], half_size: f64, device: &B::Device) -> Image<B> {
    let cx = shape[1] as f64 / 2.0;
    let cy = shape[0] as f64 / 2.0;
    generate(shape, device, |x, y| {
        if (x - cx).abs() <= half_size && (y - cy).abs() <= half_size {
            1.0
        } else {
            0.0
        }
    })
}

/// Sum of Gaussian blobs, clipped to `[0, 1]`.
///
/// Smooth and asymmetric, which gives the registration cost a well-defined
/// minimum in all four similarity parameters.
pub fn gaussian_blobs<B: Backend>(shape: [usize; 2], blobs: &[Blob], device: &B::Device) -> Image<B> {
    generate(shape, device, |x, y| {
        blobs
            .iter()
            .map(|b| {
                let (sin, cos) = b.angle.sin_cos();
                let dx = x - b.center[0];
                let dy = y - b.center[1];
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                b.amplitude
                    * (-(u * u) / (2.0 * b.sigma[0] * b.sigma[0])
                        - (v * v) / (2.0 * b.sigma[1] * b.sigma[1]))
                        .exp()
            })
            .sum()
    })
}

/// Default asymmetric three-blob phantom scaled to `shape`.
pub fn asymmetric_blobs<B: Backend>(shape: [usize; 2], device: &B::Device) -> Image<B> {
    let sx = shape[1] as f64 / 64.0;
    let sy = shape[0] as f64 / 64.0;
    let s = sx.min(sy);
    let blobs = [
        Blob { center: [26.0 * sx, 28.0 * sy], sigma: [7.0 * s, 4.0 * s], angle: 0.3, amplitude: 1.0 },
        Blob { center: [40.0 * sx, 38.0 * sy], sigma: [4.0 * s, 6.0 * s], angle: -0.2, amplitude: 0.7 },
        Blob { center: [35.0 * sx, 21.0 * sy], sigma: [3.0 * s, 3.0 * s], angle: 0.0, amplitude: 0.5 },
    ];
    gaussian_blobs(shape, &blobs, device)
}
