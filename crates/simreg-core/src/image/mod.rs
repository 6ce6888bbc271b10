//! Image types and operations.
//!
//! This module provides the Image type and the sampling-grid helper used by
//! the resampler.

pub mod image;
pub mod grid;

pub use image::Image;
pub use grid::generate_grid_2d;
