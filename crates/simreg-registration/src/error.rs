//! Error types for registration operations.
//!
//! Every failure aborts the run; there is no partial result.

use simreg_core::CoreError;
use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// Error raised by the image, transform or filter layer.
    ///
    /// Invalid similarity parameters (zero or non-finite scale) surface
    /// here as `CoreError::InvalidTransformParams`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Fixed and moving images cannot be compared.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    /// True if the error was caused by non-invertible transform parameters.
    pub fn is_invalid_transform(&self) -> bool {
        matches!(self, Self::Core(CoreError::InvalidTransformParams(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RegistrationError::numerical_instability("NaN gradient");
        assert!(matches!(err, RegistrationError::NumericalInstability(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RegistrationError::invalid_configuration("levels must be positive");
        assert_eq!(err.to_string(), "Invalid configuration: levels must be positive");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: RegistrationError = CoreError::invalid_transform("scale is zero").into();
        assert!(err.is_invalid_transform());
        assert_eq!(err.to_string(), "Invalid transform parameters: scale is zero");
    }
}
