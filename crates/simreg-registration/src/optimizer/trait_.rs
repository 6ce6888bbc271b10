//! Optimizer trait for parameter optimization.

use simreg_core::SimilarityParams;

/// Gradient-based optimizer over the four similarity parameters.
///
/// `step` is a pure function of its inputs: the updated parameters and
/// state are returned rather than written through `self`.
pub trait Optimizer {
    /// Per-run optimizer memory (moments, counters).
    type State: Clone + std::fmt::Debug;

    /// State for the first step of a run.
    fn init_state(&self) -> Self::State;

    /// Perform a single optimization step.
    ///
    /// # Arguments
    /// * `params` - Current parameters
    /// * `gradient` - Cost gradient in `[s, theta, tx, ty]` order
    /// * `state` - State returned by the previous step
    ///
    /// # Returns
    /// The updated parameters and state
    fn step(
        &self,
        params: &SimilarityParams,
        gradient: &[f64; 4],
        state: Self::State,
    ) -> (SimilarityParams, Self::State);

    /// Get the current learning rate.
    fn learning_rate(&self) -> f64;

    /// Set the learning rate.
    fn set_learning_rate(&mut self, lr: f64);
}
