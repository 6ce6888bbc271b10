//! Interpolation types and operations.
//!
//! This module provides the interpolator trait and the bilinear
//! implementation used for resampling.

pub mod trait_;
pub mod linear;

pub use trait_::{BorderMode, Interpolator};
pub use linear::LinearInterpolator;
