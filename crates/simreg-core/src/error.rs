//! Error types for core image and transform operations.

use thiserror::Error;

/// Errors raised by image construction, transforms and filters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Transform parameters that cannot be inverted or applied.
    #[error("Invalid transform parameters: {0}")]
    InvalidTransformParams(String),

    /// Image data that does not describe a usable intensity grid.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Invalid argument passed to a filter or builder.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Shape mismatch between two images.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid transform parameters error.
    pub fn invalid_transform(msg: impl Into<String>) -> Self {
        Self::InvalidTransformParams(msg.into())
    }

    /// Create an invalid image error.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a shape mismatch error from two image shapes.
    pub fn shape_mismatch(expected: [usize; 2], actual: [usize; 2]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_transform("scale is zero");
        assert_eq!(err.to_string(), "Invalid transform parameters: scale is zero");
    }

    #[test]
    fn test_shape_mismatch() {
        let err = CoreError::shape_mismatch([64, 64], [32, 48]);
        let err_str = err.to_string();
        assert!(err_str.contains("[64, 64]"));
        assert!(err_str.contains("[32, 48]"));
    }
}
