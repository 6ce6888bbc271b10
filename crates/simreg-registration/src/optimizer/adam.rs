use serde::{Deserialize, Serialize};
use simreg_core::SimilarityParams;
use crate::error::Result;
use crate::optimizer::Optimizer;
use crate::validation;

/// Adam decay rates and stability constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    /// Exponential decay rate for the first moment estimates.
    pub beta_1: f64,
    /// Exponential decay rate for the second moment estimates.
    pub beta_2: f64,
    /// Added to the denominator to prevent division by zero.
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_beta_1(mut self, beta_1: f64) -> Self {
        self.beta_1 = beta_1;
        self
    }

    pub fn with_beta_2(mut self, beta_2: f64) -> Self {
        self.beta_2 = beta_2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_decay_rate(self.beta_1, "Adam beta_1")?;
        validation::validate_decay_rate(self.beta_2, "Adam beta_2")?;
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(crate::RegistrationError::invalid_configuration(format!(
                "Adam epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Adam moment estimates and step counter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdamState {
    pub first_moment: [f64; 4],
    pub second_moment: [f64; 4],
    /// Number of steps taken; the next step uses `step + 1` for bias
    /// correction.
    pub step: u64,
    /// Set when the moments come from another pyramid level and must be
    /// rebased on the next gradient.
    #[serde(default)]
    pub carried: bool,
}

impl AdamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the momentum across a level change.
    ///
    /// Gradient magnitudes differ between levels (more pixels, finer
    /// spacing), so the raw moments are not reused. On the next step each
    /// parameter keeps only its momentum direction `m_hat / sqrt(v_hat)`,
    /// rescaled to the magnitude of the first gradient at the new level,
    /// and the counter restarts as if that were a single observation.
    pub fn carry_over(&mut self) {
        self.carried = self.step > 0;
    }

    fn rebase(&mut self, gradient: &[f64; 4], config: &AdamConfig) {
        let AdamConfig { beta_1, beta_2, epsilon } = *config;
        let t = i32::try_from(self.step).unwrap_or(i32::MAX);
        let bias_1 = 1.0 - beta_1.powi(t);
        let bias_2 = 1.0 - beta_2.powi(t);

        for i in 0..4 {
            let m_hat = self.first_moment[i] / bias_1;
            let v_hat = self.second_moment[i] / bias_2;
            let direction = if v_hat > 0.0 {
                m_hat / (v_hat.sqrt() + epsilon)
            } else {
                0.0
            };
            let magnitude = gradient[i].abs();
            self.first_moment[i] = (1.0 - beta_1) * direction * magnitude;
            self.second_moment[i] = (1.0 - beta_2) * magnitude * magnitude;
        }
        self.step = 1;
        self.carried = false;
    }
}

/// Adam optimizer.
///
/// Per-parameter update with bias-corrected moments:
///
/// ```text
/// m = b1 * m + (1 - b1) * g
/// v = b2 * v + (1 - b2) * g^2
/// p -= lr * (m / (1 - b1^t)) / (sqrt(v / (1 - b2^t)) + eps)
/// ```
///
/// A zero gradient component leaves a freshly initialised parameter
/// exactly unchanged, which is how frozen parameters stay frozen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamOptimizer {
    config: AdamConfig,
    learning_rate: f64,
}

impl AdamOptimizer {
    /// Create a new Adam optimizer with the standard constants.
    pub fn new(learning_rate: f64) -> Self {
        Self::with_config(learning_rate, AdamConfig::default())
    }

    /// Create a new Adam optimizer with custom beta values.
    pub fn with_config(learning_rate: f64, config: AdamConfig) -> Self {
        Self {
            config,
            learning_rate,
        }
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }
}

impl Optimizer for AdamOptimizer {
    type State = AdamState;

    fn init_state(&self) -> AdamState {
        AdamState::new()
    }

    fn step(
        &self,
        params: &SimilarityParams,
        gradient: &[f64; 4],
        mut state: AdamState,
    ) -> (SimilarityParams, AdamState) {
        let AdamConfig { beta_1, beta_2, epsilon } = self.config;

        if state.carried {
            state.rebase(gradient, &self.config);
        }
        state.step += 1;
        let t = i32::try_from(state.step).unwrap_or(i32::MAX);
        let bias_1 = 1.0 - beta_1.powi(t);
        let bias_2 = 1.0 - beta_2.powi(t);

        let mut values = params.to_array();
        for (i, value) in values.iter_mut().enumerate() {
            let g = gradient[i];
            state.first_moment[i] = beta_1 * state.first_moment[i] + (1.0 - beta_1) * g;
            state.second_moment[i] = beta_2 * state.second_moment[i] + (1.0 - beta_2) * g * g;

            let m_hat = state.first_moment[i] / bias_1;
            let v_hat = state.second_moment[i] / bias_2;
            *value -= self.learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }

        (SimilarityParams::from_array(values), state)
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let optimizer = AdamOptimizer::new(0.1);
        let (params, state) = optimizer.step(
            &SimilarityParams::identity(),
            &[2.0, -0.5, 100.0, 0.0],
            optimizer.init_state(),
        );

        // With bias correction the first step is lr * sign(g).
        assert!((params.scale - 0.9).abs() < 1e-6);
        assert!((params.rotation - 0.1).abs() < 1e-6);
        assert!((params.translation_x + 0.1).abs() < 1e-6);
        assert_eq!(params.translation_y, 0.0);
        assert_eq!(state.step, 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut optimizer = AdamOptimizer::new(0.05);
        let target = [1.3, -0.2, 4.0, -3.0];
        let mut params = SimilarityParams::identity();
        let mut state = optimizer.init_state();

        for i in 0..2000 {
            if i == 1000 {
                optimizer.set_learning_rate(0.005);
            }
            let p = params.to_array();
            let grad = [
                2.0 * (p[0] - target[0]),
                2.0 * (p[1] - target[1]),
                2.0 * (p[2] - target[2]),
                2.0 * (p[3] - target[3]),
            ];
            let (next, next_state) = optimizer.step(&params, &grad, state);
            params = next;
            state = next_state;
        }

        for (value, expected) in params.to_array().iter().zip(target) {
            assert!((value - expected).abs() < 0.02, "{} vs {}", value, expected);
        }
        assert_eq!(state.step, 2000);
    }

    #[test]
    fn test_carried_state_is_rebased_on_new_gradient() {
        let optimizer = AdamOptimizer::new(0.1);
        let mut state = AdamState {
            first_moment: [0.5, -0.5, 40.0, 3.0],
            second_moment: [0.25, 0.25, 1600.0, 9.0],
            step: 200,
            carried: false,
        };
        state.carry_over();
        assert!(state.carried);

        let gradient = [2.0, -0.5, 1e4, 0.0];
        let (params, state) = optimizer.step(&SimilarityParams::identity(), &gradient, state);

        assert!(!state.carried);
        assert_eq!(state.step, 2);
        for (i, g) in gradient.iter().enumerate() {
            let expected = (0.999 * 0.001 + 0.001) * g * g;
            assert!((state.second_moment[i] - expected).abs() <= 1e-12 * expected.max(1.0));
        }

        // A large gradient jump at the new level still gives a bounded step.
        let delta: Vec<f64> = params
            .to_array()
            .iter()
            .zip(SimilarityParams::identity().to_array())
            .map(|(p, q)| p - q)
            .collect();
        for d in &delta {
            assert!(d.abs() <= 0.1 + 1e-9, "{:?}", delta);
        }
        // Momentum and gradient agree in sign for scale and translation x.
        assert!(delta[0] < -0.05 && delta[2] < -0.05, "{:?}", delta);
        // A zero gradient at the new level leaves the parameter in place.
        assert_eq!(delta[3], 0.0);
        assert_eq!(state.first_moment[3], 0.0);
    }

    #[test]
    fn test_carry_over_without_history_is_a_fresh_start() {
        let optimizer = AdamOptimizer::new(0.1);
        let mut state = optimizer.init_state();
        state.carry_over();
        assert!(!state.carried);

        let (params, state) = optimizer.step(&SimilarityParams::identity(), &[1.0, 0.0, 0.0, 0.0], state);
        assert!((params.scale - 0.9).abs() < 1e-6);
        assert_eq!(state.step, 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(AdamConfig::default().validate().is_ok());
        assert!(AdamConfig::new().with_beta_1(1.0).validate().is_err());
        assert!(AdamConfig::new().with_epsilon(0.0).validate().is_err());
    }
}
