pub mod gaussian;
pub mod downsample;
pub mod pyramid;
pub mod resample;

pub use gaussian::GaussianFilter;
pub use downsample::DownsampleFilter;
pub use pyramid::{build_pyramid, MultiResolutionPyramid};
pub use resample::{resample, resize, warp, ResampleImageFilter};
