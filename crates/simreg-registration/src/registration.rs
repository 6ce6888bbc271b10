use std::marker::PhantomData;
use std::time::Duration;
use burn::tensor::backend::Backend;
use simreg_core::{Image, SimilarityParams};
use crate::config::ParameterMask;
use crate::error::Result;
use crate::gradient::FiniteDifferenceGradient;
use crate::metric::SumOfSquaredDifferences;
use crate::optimizer::Optimizer;
use crate::progress::{ProgressInfo, ProgressTracker};

/// Outcome of optimizing at one resolution.
#[derive(Debug, Clone)]
pub struct LevelOutcome<S> {
    pub params: SimilarityParams,
    pub state: S,
    /// Cost before each step, one entry per iteration.
    pub cost_history: Vec<f64>,
}

/// Single-resolution optimization loop.
///
/// Every iteration evaluates the cost at the current parameters, estimates
/// the gradient by central differences and takes one optimizer step. There
/// is no convergence test; the loop always runs the requested number of
/// iterations.
pub struct Registration<B, O>
where
    B: Backend,
    O: Optimizer,
{
    optimizer: O,
    metric: SumOfSquaredDifferences,
    gradient: FiniteDifferenceGradient,
    mask: ParameterMask,
    log_interval: usize,
    level: usize,
    tracker: ProgressTracker,
    _phantom: PhantomData<B>,
}

impl<B, O> Registration<B, O>
where
    B: Backend,
    O: Optimizer,
{
    pub fn new(optimizer: O, metric: SumOfSquaredDifferences, gradient: FiniteDifferenceGradient) -> Self {
        Self {
            optimizer,
            metric,
            gradient,
            mask: ParameterMask::all(),
            log_interval: 10,
            level: 0,
            tracker: ProgressTracker::new(),
            _phantom: PhantomData,
        }
    }

    pub fn with_mask(mut self, mask: ParameterMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    /// Pyramid level reported in logs and progress events.
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Run `iterations` optimizer steps starting from `params` and `state`.
    ///
    /// # Errors
    /// Fails on the first invalid parameter vector, non-finite cost or
    /// non-finite gradient.
    pub fn execute(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        mut params: SimilarityParams,
        mut state: O::State,
        iterations: usize,
    ) -> Result<LevelOutcome<O::State>> {
        let mut cost_history = Vec::with_capacity(iterations);
        let learning_rate = self.optimizer.learning_rate();

        for t in 1..=iterations {
            let cost = self.metric.evaluate(fixed, moving, &params)?;
            cost_history.push(cost);

            let grad = self.gradient.compute(
                |p| self.metric.evaluate(fixed, moving, p),
                &params,
                &self.mask,
            )?;

            let (next, next_state) = self.optimizer.step(&params, &grad, state);
            next.validate()?;
            params = next;
            state = next_state;

            if t % self.log_interval == 0 {
                tracing::info!(
                    "Level {} iteration {}/{}: cost {:.6}, {}",
                    self.level,
                    t,
                    iterations,
                    cost,
                    params
                );
            }

            self.tracker.update(
                ProgressInfo::new(t, Some(iterations), cost, Duration::ZERO, learning_rate)
                    .with_level(self.level)
                    .with_params(params),
            );
        }

        Ok(LevelOutcome {
            params,
            state,
            cost_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use simreg_core::filter::warp;
    use simreg_core::phantom;
    use crate::optimizer::AdamOptimizer;

    type B = NdArray<f64>;

    fn registration(lr: f64) -> Registration<B, AdamOptimizer> {
        Registration::new(
            AdamOptimizer::new(lr),
            SumOfSquaredDifferences::new(),
            FiniteDifferenceGradient::default(),
        )
    }

    #[test]
    fn test_translation_only_recovery() {
        let device = Default::default();
        let fixed = phantom::asymmetric_blobs::<B>([32, 32], &device);
        let moving = warp(&fixed, &SimilarityParams::new(1.0, 0.0, 1.5, -1.0), [32, 32], 0.0).unwrap();

        let reg = registration(0.05).with_mask(ParameterMask::translation_only());
        let state = reg.optimizer().init_state();
        let outcome = reg
            .execute(&fixed, &moving, SimilarityParams::identity(), state, 200)
            .unwrap();

        assert_eq!(outcome.cost_history.len(), 200);
        assert_eq!(outcome.state.step, 200);
        assert_eq!(outcome.params.scale, 1.0);
        assert_eq!(outcome.params.rotation, 0.0);
        assert!((outcome.params.translation_x + 1.5).abs() < 0.2);
        assert!((outcome.params.translation_y - 1.0).abs() < 0.2);
        assert!(outcome.cost_history[199] < outcome.cost_history[0]);
    }

    #[test]
    fn test_identical_images_stay_put() {
        let device = Default::default();
        let image = phantom::asymmetric_blobs::<B>([16, 16], &device);

        let reg = registration(0.01);
        let state = reg.optimizer().init_state();
        let outcome = reg
            .execute(&image, &image, SimilarityParams::identity(), state, 5)
            .unwrap();

        assert_eq!(outcome.cost_history[0], 0.0);
        for (value, expected) in outcome.params.to_array().iter().zip([1.0, 0.0, 0.0, 0.0]) {
            assert!((value - expected).abs() < 0.1);
        }
    }
}
