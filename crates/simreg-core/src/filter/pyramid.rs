use burn::tensor::backend::Backend;
use crate::error::{CoreError, Result};
use crate::image::Image;
use super::gaussian::GaussianFilter;
use super::downsample::DownsampleFilter;

/// Shrink factor between consecutive levels.
pub const LEVEL_FACTOR: usize = 2;

/// Multi-resolution image pyramid.
///
/// Levels are stored coarsest first. The finest level is the input image
/// itself; every coarser level is the next finer one smoothed with a
/// Gaussian of `sigma = 0.5 * LEVEL_FACTOR` and decimated by
/// `LEVEL_FACTOR`. Each level's spacing records its total shrink factor
/// relative to the input.
pub struct MultiResolutionPyramid<B: Backend> {
    images: Vec<Image<B>>,
}

impl<B: Backend> MultiResolutionPyramid<B> {
    /// Build a pyramid with `num_levels` levels.
    ///
    /// Once an axis reaches a single pixel it stays at one pixel, so very
    /// deep pyramids repeat their coarsest shape.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `num_levels` is zero.
    pub fn new(input: &Image<B>, num_levels: usize) -> Result<Self> {
        if num_levels == 0 {
            return Err(CoreError::invalid_argument("pyramid needs at least one level"));
        }

        let smoother = GaussianFilter::<B>::new(0.5 * LEVEL_FACTOR as f64);
        let downsampler = DownsampleFilter::<B>::new(LEVEL_FACTOR);

        let mut images = Vec::with_capacity(num_levels);
        images.push(input.clone());
        for _ in 1..num_levels {
            let finer = &images[images.len() - 1];
            let coarser = downsampler.apply(&smoother.apply(finer));
            tracing::trace!("pyramid level {:?} -> {:?}", finer.shape(), coarser.shape());
            images.push(coarser);
        }
        images.reverse();

        Ok(Self { images })
    }

    /// Get image at specific level (0 is coarsest).
    ///
    /// # Panics
    /// Panics if `level >= self.levels()`.
    pub fn get_level(&self, level: usize) -> &Image<B> {
        &self.images[level]
    }

    /// Get number of levels.
    pub fn levels(&self) -> usize {
        self.images.len()
    }

    /// Shrink factor of a level relative to the input image.
    pub fn scale_factor(&self, level: usize) -> f64 {
        self.images[level].spacing()
    }

    pub fn finest(&self) -> &Image<B> {
        &self.images[self.images.len() - 1]
    }

    /// Level shapes, coarsest first.
    pub fn shapes(&self) -> Vec<[usize; 2]> {
        self.images.iter().map(Image::shape).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image<B>> {
        self.images.iter()
    }

    pub fn into_images(self) -> Vec<Image<B>> {
        self.images
    }
}

/// Ordered sequence of `num_levels` images, coarsest first.
pub fn build_pyramid<B: Backend>(image: &Image<B>, num_levels: usize) -> Result<Vec<Image<B>>> {
    Ok(MultiResolutionPyramid::new(image, num_levels)?.into_images())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f64>;

    #[test]
    fn test_halving_shapes_and_factors() {
        let device = Default::default();
        let image = Image::<B>::filled([64, 48], 1.0, &device);
        let pyramid = MultiResolutionPyramid::new(&image, 4).unwrap();

        assert_eq!(pyramid.levels(), 4);
        assert_eq!(pyramid.shapes(), vec![[8, 6], [16, 12], [32, 24], [64, 48]]);
        assert_eq!(pyramid.scale_factor(0), 8.0);
        assert_eq!(pyramid.scale_factor(3), 1.0);
        assert_eq!(pyramid.finest().to_vec(), image.to_vec());
    }

    #[test]
    fn test_zero_levels_rejected() {
        let device = Default::default();
        let image = Image::<B>::filled([8, 8], 1.0, &device);
        assert!(matches!(
            MultiResolutionPyramid::new(&image, 0),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_single_level_is_input() {
        let device = Default::default();
        let image = Image::<B>::filled([5, 7], 0.3, &device);
        let levels = build_pyramid(&image, 1).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].shape(), [5, 7]);
    }
}
