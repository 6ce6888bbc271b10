//! Validation utilities for registration operations.
//!
//! All checks run eagerly, before any optimization work starts, and fail
//! with the first violated rule.

use burn::tensor::{backend::Backend, ElementConversion};
use simreg_core::Image;
use crate::error::{RegistrationError, Result};

/// Upper bound on pyramid depth; 2^16 shrink is far below one pixel for
/// any realistic image.
pub const MAX_LEVELS: usize = 16;

/// Validate that two images have the same shape.
pub fn validate_image_shapes<B: Backend>(fixed: &Image<B>, moving: &Image<B>) -> Result<()> {
    let fixed_shape = fixed.shape();
    let moving_shape = moving.shape();

    if fixed_shape != moving_shape {
        return Err(RegistrationError::dimension_mismatch(format!(
            "fixed image is {:?} but moving image is {:?}",
            fixed_shape, moving_shape
        )));
    }

    Ok(())
}

/// Validate that every intensity of `image` is finite.
pub fn validate_image_finite<B: Backend>(image: &Image<B>, name: &str) -> Result<()> {
    let total = image.data().clone().abs().sum().into_scalar().elem::<f64>();
    if !total.is_finite() {
        return Err(RegistrationError::numerical_instability(format!(
            "{} image contains non-finite intensities",
            name
        )));
    }
    Ok(())
}

/// Validate that a computed scalar is finite.
pub fn validate_finite(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(RegistrationError::numerical_instability(format!(
            "{} is not finite ({})",
            what, value
        )));
    }
    Ok(())
}

/// Validate learning rate.
pub fn validate_learning_rate(lr: f64) -> Result<()> {
    if !lr.is_finite() || lr <= 0.0 {
        return Err(RegistrationError::invalid_configuration(
            format!("Learning rate must be positive and finite, got {}", lr),
        ));
    }

    if lr > 10.0 {
        return Err(RegistrationError::invalid_configuration(
            format!("Learning rate too large: {}", lr),
        ));
    }

    if lr < 1e-10 {
        return Err(RegistrationError::invalid_configuration(
            format!("Learning rate too small: {}", lr),
        ));
    }

    Ok(())
}

/// Validate iteration count.
pub fn validate_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Iterations must be positive",
        ));
    }

    if iterations > 1_000_000 {
        return Err(RegistrationError::invalid_configuration(
            format!("Iterations too large: {}", iterations),
        ));
    }

    Ok(())
}

/// Validate pyramid depth.
pub fn validate_num_levels(levels: usize) -> Result<()> {
    if levels == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Number of pyramid levels must be positive",
        ));
    }

    if levels > MAX_LEVELS {
        return Err(RegistrationError::invalid_configuration(format!(
            "Number of pyramid levels too large: {} (max {})",
            levels, MAX_LEVELS
        )));
    }

    Ok(())
}

/// Validate the central-difference step.
pub fn validate_finite_difference_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Finite difference epsilon must be positive and finite, got {}",
            epsilon
        )));
    }
    Ok(())
}

/// Validate an exponential decay rate in `[0, 1)`.
pub fn validate_decay_rate(beta: f64, name: &str) -> Result<()> {
    if !(0.0..1.0).contains(&beta) {
        return Err(RegistrationError::invalid_configuration(format!(
            "{} must be in [0, 1), got {}",
            name, beta
        )));
    }
    Ok(())
}

pub fn validate_log_interval(interval: usize) -> Result<()> {
    if interval == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Log interval must be positive",
        ));
    }
    Ok(())
}
