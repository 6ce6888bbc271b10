//! Core building blocks for 2D similarity registration.
//!
//! Images are stored as burn tensors so the same code runs on any backend;
//! the small amount of fixed-size geometry (3x3 homogeneous matrices, 2x2
//! inverse mappings) is done with nalgebra on the host.

pub mod error;
pub mod image;
pub mod transform;
pub mod interpolation;
pub mod filter;
pub mod phantom;

pub use error::{CoreError, Result};
pub use image::Image;
pub use transform::{AffineMapping, SimilarityParams, SimilarityTransform};
