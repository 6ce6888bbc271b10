//! Registration configuration.

use serde::{Deserialize, Serialize};
use simreg_core::SimilarityParams;
use crate::error::Result;
use crate::optimizer::AdamConfig;
use crate::validation;

/// Which similarity parameters the optimizer may change.
///
/// A frozen parameter keeps its initial value for the whole run and its
/// gradient component is never estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMask {
    pub scale: bool,
    pub rotation: bool,
    pub translation_x: bool,
    pub translation_y: bool,
}

impl ParameterMask {
    /// Every parameter trainable.
    pub fn all() -> Self {
        Self::from_array([true; 4])
    }

    /// Only the two translation components trainable.
    pub fn translation_only() -> Self {
        Self::from_array([false, false, true, true])
    }

    /// Mask in `[s, theta, tx, ty]` order.
    pub fn to_array(&self) -> [bool; 4] {
        [self.scale, self.rotation, self.translation_x, self.translation_y]
    }

    pub fn from_array(values: [bool; 4]) -> Self {
        Self {
            scale: values[0],
            rotation: values[1],
            translation_x: values[2],
            translation_y: values[3],
        }
    }

    pub fn is_trainable(&self, index: usize) -> bool {
        self.to_array().get(index).copied().unwrap_or(false)
    }

    /// Number of trainable parameters.
    pub fn count(&self) -> usize {
        self.to_array().iter().filter(|&&t| t).count()
    }
}

impl Default for ParameterMask {
    fn default() -> Self {
        Self::all()
    }
}

/// What happens to the Adam moments when moving to a finer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MomentTransition {
    /// Zero moments and step counter at every level.
    #[default]
    Reset,
    /// Keep each parameter's momentum direction, rescaled to the gradient
    /// magnitude at the new level; the step counter restarts.
    Carry,
}

/// Configuration of a multi-resolution registration run.
///
/// # Examples
/// ```rust
/// use simreg_registration::{MomentTransition, RegistrationConfig};
///
/// let config = RegistrationConfig::new()
///     .with_num_levels(3)
///     .with_learning_rate(0.05)
///     .with_moment_transition(MomentTransition::Carry);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Number of pyramid levels, including full resolution.
    pub num_levels: usize,
    /// Optimizer steps per level.
    pub iterations_per_level: usize,
    /// Adam learning rate, in parameter units per step.
    pub learning_rate: f64,
    /// Half-width of the central difference.
    pub finite_difference_epsilon: f64,
    pub adam: AdamConfig,
    pub moment_transition: MomentTransition,
    pub trainable: ParameterMask,
    /// Intensity assigned to samples that fall outside the moving image.
    pub fill_value: f64,
    /// Resize the moving image to the fixed image's shape instead of
    /// rejecting mismatched inputs.
    pub match_dimensions: bool,
    /// Log cost and parameters every this many iterations.
    pub log_interval: usize,
    /// Starting parameters, translation in full-resolution pixels.
    pub initial_params: SimilarityParams,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            num_levels: 4,
            iterations_per_level: 300,
            learning_rate: 0.01,
            finite_difference_epsilon: 1e-5,
            adam: AdamConfig::default(),
            moment_transition: MomentTransition::Reset,
            trainable: ParameterMask::all(),
            fill_value: 0.0,
            match_dimensions: false,
            log_interval: 10,
            initial_params: SimilarityParams::identity(),
        }
    }
}

impl RegistrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_levels(mut self, levels: usize) -> Self {
        self.num_levels = levels;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations_per_level = iterations;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_finite_difference_epsilon(mut self, epsilon: f64) -> Self {
        self.finite_difference_epsilon = epsilon;
        self
    }

    pub fn with_adam(mut self, adam: AdamConfig) -> Self {
        self.adam = adam;
        self
    }

    pub fn with_moment_transition(mut self, transition: MomentTransition) -> Self {
        self.moment_transition = transition;
        self
    }

    pub fn with_trainable(mut self, mask: ParameterMask) -> Self {
        self.trainable = mask;
        self
    }

    pub fn with_fill_value(mut self, value: f64) -> Self {
        self.fill_value = value;
        self
    }

    pub fn with_match_dimensions(mut self, enabled: bool) -> Self {
        self.match_dimensions = enabled;
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_initial_params(mut self, params: SimilarityParams) -> Self {
        self.initial_params = params;
        self
    }

    /// Check every field, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        validation::validate_num_levels(self.num_levels)?;
        validation::validate_iterations(self.iterations_per_level)?;
        validation::validate_learning_rate(self.learning_rate)?;
        validation::validate_finite_difference_epsilon(self.finite_difference_epsilon)?;
        self.adam.validate()?;
        validation::validate_log_interval(self.log_interval)?;
        if !self.fill_value.is_finite() {
            return Err(crate::RegistrationError::invalid_configuration(format!(
                "Fill value must be finite, got {}",
                self.fill_value
            )));
        }
        self.initial_params.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistrationConfig::default();
        assert_eq!(config.num_levels, 4);
        assert_eq!(config.iterations_per_level, 300);
        assert_eq!(config.finite_difference_epsilon, 1e-5);
        assert_eq!(config.adam.beta_1, 0.9);
        assert_eq!(config.adam.beta_2, 0.999);
        assert_eq!(config.adam.epsilon, 1e-8);
        assert_eq!(config.moment_transition, MomentTransition::Reset);
        assert_eq!(config.log_interval, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistrationConfig =
            serde_json::from_str(r#"{"num_levels": 2, "moment_transition": "Carry"}"#).unwrap();
        assert_eq!(config.num_levels, 2);
        assert_eq!(config.moment_transition, MomentTransition::Carry);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.trainable, ParameterMask::all());
    }

    #[test]
    fn test_mask() {
        let mask = ParameterMask::translation_only();
        assert_eq!(mask.count(), 2);
        assert!(!mask.is_trainable(SimilarityParams::SCALE));
        assert!(mask.is_trainable(SimilarityParams::TRANSLATION_Y));
        assert!(!mask.is_trainable(7));
    }

    #[test]
    fn test_invalid_initial_scale_rejected() {
        let config = RegistrationConfig::new()
            .with_initial_params(SimilarityParams::new(0.0, 0.0, 0.0, 0.0));
        assert!(config.validate().unwrap_err().is_invalid_transform());
    }
}
