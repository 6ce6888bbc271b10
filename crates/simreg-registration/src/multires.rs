//! Coarse-to-fine registration driver.
//!
//! The driver walks an explicit state machine:
//!
//! ```text
//! Initializing -> OptimizingLevel(0) -> TransitioningLevel(0 -> 1)
//!              -> OptimizingLevel(1) -> ... -> Finalizing -> Done
//! ```
//!
//! Translations are carried in the pixel units of the current level and
//! rescaled by the spacing ratio at every transition; scale and rotation
//! pass through unchanged. The final parameters are applied once to the
//! full-resolution moving image.

use std::fmt;
use std::sync::Arc;
use burn::tensor::backend::Backend;
use simreg_core::filter::{resize, warp, MultiResolutionPyramid};
use simreg_core::{Image, SimilarityParams};
use crate::config::{MomentTransition, RegistrationConfig};
use crate::error::{RegistrationError, Result};
use crate::gradient::FiniteDifferenceGradient;
use crate::metric::SumOfSquaredDifferences;
use crate::optimizer::{AdamOptimizer, AdamState};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::registration::Registration;
use crate::validation;

/// Per-level iteration counts and learning rates, coarsest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationSchedule {
    pub iterations: Vec<usize>,
    pub learning_rates: Vec<f64>,
}

impl RegistrationSchedule {
    /// Same iteration count and learning rate at every level.
    pub fn uniform(levels: usize, iterations: usize, learning_rate: f64) -> Self {
        Self {
            iterations: vec![iterations; levels],
            learning_rates: vec![learning_rate; levels],
        }
    }

    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self::uniform(config.num_levels, config.iterations_per_level, config.learning_rate)
    }

    pub fn with_iterations(mut self, iterations: Vec<usize>) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_learning_rates(mut self, learning_rates: Vec<f64>) -> Self {
        self.learning_rates = learning_rates;
        self
    }

    pub fn levels(&self) -> usize {
        self.iterations.len()
    }

    /// Optimizer steps over the whole run.
    pub fn total_iterations(&self) -> usize {
        self.iterations.iter().sum()
    }

    /// Check the schedule covers exactly `num_levels` levels with valid
    /// entries.
    pub fn validate(&self, num_levels: usize) -> Result<()> {
        if self.iterations.len() != num_levels || self.learning_rates.len() != num_levels {
            return Err(RegistrationError::invalid_configuration(format!(
                "schedule has {} iteration counts and {} learning rates for {} levels",
                self.iterations.len(),
                self.learning_rates.len(),
                num_levels
            )));
        }
        for &iterations in &self.iterations {
            validation::validate_iterations(iterations)?;
        }
        for &lr in &self.learning_rates {
            validation::validate_learning_rate(lr)?;
        }
        Ok(())
    }
}

/// Driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    /// Validating inputs and building pyramids.
    Initializing,
    /// Running the optimizer at a pyramid level (0 is coarsest).
    OptimizingLevel(usize),
    /// Rescaling parameters and optimizer state between two levels.
    TransitioningLevel { from: usize, to: usize },
    /// Warping the full-resolution moving image.
    Finalizing,
    Done,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::OptimizingLevel(level) => write!(f, "optimizing level {}", level),
            Self::TransitioningLevel { from, to } => write!(f, "transitioning level {} -> {}", from, to),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What happened at one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub level: usize,
    pub shape: [usize; 2],
    /// Pixel size relative to full resolution.
    pub scale_factor: f64,
    pub iterations: usize,
    pub learning_rate: f64,
    pub first_cost: f64,
    pub last_cost: f64,
    /// Parameters on leaving the level, translation in level pixels.
    pub params: SimilarityParams,
}

/// Output of a complete registration run.
#[derive(Debug, Clone)]
pub struct RegistrationResult<B: Backend> {
    /// Moving image warped onto the fixed image's grid.
    pub registered: Image<B>,
    /// Final parameters, translation in full-resolution pixels.
    pub params: SimilarityParams,
    /// One cost per iteration, all levels concatenated, coarsest first.
    pub cost_history: Vec<f64>,
    pub levels: Vec<LevelSummary>,
    /// Full-resolution SSD before registration (identity parameters).
    pub initial_ssd: f64,
    /// Full-resolution SSD between the fixed and registered images.
    pub final_ssd: f64,
}

impl<B: Backend> RegistrationResult<B> {
    /// Fraction of the initial SSD removed by registration.
    pub fn ssd_reduction(&self) -> f64 {
        if self.initial_ssd > 0.0 {
            1.0 - self.final_ssd / self.initial_ssd
        } else {
            0.0
        }
    }
}

/// Multi-resolution registration framework.
///
/// Orchestrates the registration process across multiple resolution levels
/// (coarse-to-fine) to improve robustness and convergence range.
///
/// # Examples
/// ```rust,no_run
/// use burn_ndarray::NdArray;
/// use simreg_core::{phantom, SimilarityParams};
/// use simreg_core::filter::warp;
/// use simreg_registration::{MultiResolutionRegistration, RegistrationConfig};
///
/// type Backend = NdArray<f64>;
///
/// let device = Default::default();
/// let fixed = phantom::asymmetric_blobs::<Backend>([64, 64], &device);
/// let moving = warp(&fixed, &SimilarityParams::new(1.05, 0.05, 2.0, -1.0), [64, 64], 0.0).unwrap();
///
/// let mut driver = MultiResolutionRegistration::new(RegistrationConfig::default()).unwrap();
/// let result = driver.execute(&fixed, &moving).unwrap();
/// println!("{}", result.params);
/// ```
pub struct MultiResolutionRegistration {
    config: RegistrationConfig,
    schedule: RegistrationSchedule,
    tracker: ProgressTracker,
    stage: RegistrationStage,
}

impl MultiResolutionRegistration {
    /// Create a driver with a uniform schedule taken from `config`.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` (or `Core(InvalidTransformParams)` for
    /// bad initial parameters) if `config` does not validate.
    pub fn new(config: RegistrationConfig) -> Result<Self> {
        config.validate()?;
        let schedule = RegistrationSchedule::from_config(&config);
        Ok(Self {
            config,
            schedule,
            tracker: ProgressTracker::new(),
            stage: RegistrationStage::Initializing,
        })
    }

    /// Replace the per-level schedule.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the schedule length differs from
    /// the configured number of levels or holds invalid entries.
    pub fn with_schedule(mut self, schedule: RegistrationSchedule) -> Result<Self> {
        schedule.validate(self.config.num_levels)?;
        self.schedule = schedule;
        Ok(self)
    }

    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.tracker.add_callback(callback);
        self
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn schedule(&self) -> &RegistrationSchedule {
        &self.schedule
    }

    /// Stage reached by the last call to [`execute`](Self::execute).
    pub fn stage(&self) -> RegistrationStage {
        self.stage
    }

    fn enter(&mut self, stage: RegistrationStage) {
        tracing::debug!("{} -> {}", self.stage, stage);
        self.stage = stage;
        self.tracker.stage(&stage);
    }

    /// Register `moving` onto `fixed`.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the shapes differ and dimension matching is
    ///   disabled
    /// * `Core(InvalidTransformParams)` if the parameters become invalid
    /// * `NumericalInstability` on a non-finite image, cost or gradient
    pub fn execute<B: Backend>(
        &mut self,
        fixed: &Image<B>,
        moving: &Image<B>,
    ) -> Result<RegistrationResult<B>> {
        self.tracker.start();
        let result = self.run(fixed, moving);
        match &result {
            Ok(result) => {
                let lr = self.schedule.learning_rates.last().copied().unwrap_or(0.0);
                self.tracker.complete(result.final_ssd, lr, result.params);
            }
            Err(err) => self.tracker.error(&err.to_string()),
        }
        result
    }

    fn run<B: Backend>(&mut self, fixed: &Image<B>, moving: &Image<B>) -> Result<RegistrationResult<B>> {
        self.stage = RegistrationStage::Initializing;
        self.tracker.stage(&RegistrationStage::Initializing);

        let config = self.config.clone();
        let schedule = self.schedule.clone();
        schedule.validate(config.num_levels)?;

        validation::validate_image_finite(fixed, "fixed")?;
        validation::validate_image_finite(moving, "moving")?;

        let moving = if fixed.shape() != moving.shape() && config.match_dimensions {
            tracing::warn!(
                "Resizing moving image from {:?} to {:?}",
                moving.shape(),
                fixed.shape()
            );
            resize(moving, fixed.shape())?
        } else {
            validation::validate_image_shapes(fixed, moving)?;
            moving.clone()
        };

        let fixed_pyramid = MultiResolutionPyramid::new(fixed, config.num_levels)?;
        let moving_pyramid = MultiResolutionPyramid::new(&moving, config.num_levels)?;
        for level in 0..config.num_levels {
            validation::validate_image_shapes(
                fixed_pyramid.get_level(level),
                moving_pyramid.get_level(level),
            )
            .map_err(|_| {
                RegistrationError::dimension_mismatch(format!(
                    "pyramid level {}: fixed {:?}, moving {:?}",
                    level,
                    fixed_pyramid.get_level(level).shape(),
                    moving_pyramid.get_level(level).shape()
                ))
            })?;
        }
        tracing::info!(
            "Pyramid levels (coarsest first): {:?}",
            fixed_pyramid.shapes()
        );

        let metric = SumOfSquaredDifferences::new().with_fill_value(config.fill_value);
        let gradient = FiniteDifferenceGradient::new(config.finite_difference_epsilon);

        let mut params = config
            .initial_params
            .rescale_translation(1.0 / fixed_pyramid.scale_factor(0));
        let mut state = AdamState::new();
        let mut cost_history = Vec::with_capacity(schedule.total_iterations());
        let mut levels = Vec::with_capacity(config.num_levels);

        for level in 0..config.num_levels {
            if level > 0 {
                self.enter(RegistrationStage::TransitioningLevel { from: level - 1, to: level });
                let ratio = fixed_pyramid.scale_factor(level - 1) / fixed_pyramid.scale_factor(level);
                params = params.rescale_translation(ratio);
                state = match config.moment_transition {
                    MomentTransition::Reset => AdamState::new(),
                    MomentTransition::Carry => {
                        state.carry_over();
                        state
                    }
                };
            }

            self.enter(RegistrationStage::OptimizingLevel(level));
            let fixed_level = fixed_pyramid.get_level(level);
            let moving_level = moving_pyramid.get_level(level);
            let iterations = schedule.iterations[level];
            let learning_rate = schedule.learning_rates[level];

            tracing::info!(
                "Starting level {}/{} with lr={}, iters={}, size={:?}",
                level + 1,
                config.num_levels,
                learning_rate,
                iterations,
                fixed_level.shape()
            );

            let registration = Registration::new(
                AdamOptimizer::with_config(learning_rate, config.adam),
                metric,
                gradient,
            )
            .with_mask(config.trainable)
            .with_log_interval(config.log_interval)
            .with_level(level)
            .with_tracker(self.tracker.clone());

            let outcome = registration.execute(fixed_level, moving_level, params, state, iterations)?;
            params = outcome.params;
            state = outcome.state;

            let first_cost = outcome.cost_history.first().copied().unwrap_or(0.0);
            let last_cost = outcome.cost_history.last().copied().unwrap_or(0.0);
            tracing::info!(
                "Finished level {}: cost {:.6} -> {:.6}, {}",
                level + 1,
                first_cost,
                last_cost,
                params
            );

            levels.push(LevelSummary {
                level,
                shape: fixed_level.shape(),
                scale_factor: fixed_pyramid.scale_factor(level),
                iterations,
                learning_rate,
                first_cost,
                last_cost,
                params,
            });
            cost_history.extend(outcome.cost_history);
        }

        self.enter(RegistrationStage::Finalizing);
        let last = config.num_levels - 1;
        let params = params.rescale_translation(fixed_pyramid.scale_factor(last));
        let registered = warp(&moving, &params, fixed.shape(), config.fill_value)?;

        let initial_ssd = metric.evaluate(fixed, &moving, &SimilarityParams::identity())?;
        let final_ssd = metric.evaluate(fixed, &registered, &SimilarityParams::identity())?;
        tracing::info!(
            "Registration finished: {}, SSD {:.6} -> {:.6}",
            params,
            initial_ssd,
            final_ssd
        );

        self.enter(RegistrationStage::Done);
        Ok(RegistrationResult {
            registered,
            params,
            cost_history,
            levels,
            initial_ssd,
            final_ssd,
        })
    }
}

/// Run a multi-resolution registration with `config`.
pub fn register<B: Backend>(
    fixed: &Image<B>,
    moving: &Image<B>,
    config: RegistrationConfig,
) -> Result<RegistrationResult<B>> {
    MultiResolutionRegistration::new(config)?.execute(fixed, moving)
}
