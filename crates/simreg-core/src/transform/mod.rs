//! Spatial transforms.
//!
//! [`SimilarityParams`] is the 4-parameter vector the optimizer works on,
//! [`SimilarityTransform`] binds it to a rotation/scaling centre, and
//! [`AffineMapping`] is the inverse `(matrix, offset)` pair the resampler
//! consumes.

pub mod trait_;
pub mod affine;
pub mod similarity;

pub use trait_::Transform;
pub use affine::AffineMapping;
pub use similarity::{SimilarityParams, SimilarityTransform};
