//! Progress tracking and callbacks for registration runs.
//!
//! Callbacks observe the run; they cannot stop it early. Every run performs
//! exactly `levels x iterations` optimizer steps.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use simreg_core::SimilarityParams;
use crate::multires::RegistrationStage;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Progress information for one optimizer iteration.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Pyramid level, 0 is coarsest.
    pub level: usize,
    /// Iteration within the level, starting at 1.
    pub iteration: usize,
    /// Iterations scheduled for the level (if known).
    pub total_iterations: Option<usize>,
    /// SSD cost before this iteration's step.
    pub loss: f64,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining in the level.
    pub estimated_remaining: Option<Duration>,
    /// Current learning rate.
    pub learning_rate: f64,
    /// Parameters after this iteration's step, in level pixels.
    pub params: SimilarityParams,
}

impl ProgressInfo {
    /// Create new progress information.
    pub fn new(
        iteration: usize,
        total_iterations: Option<usize>,
        loss: f64,
        elapsed: Duration,
        learning_rate: f64,
    ) -> Self {
        Self {
            level: 0,
            iteration,
            total_iterations,
            loss,
            elapsed,
            estimated_remaining: None,
            learning_rate,
            params: SimilarityParams::identity(),
        }
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_params(mut self, params: SimilarityParams) -> Self {
        self.params = params;
        self
    }

    /// Fraction of the level completed, in percent.
    pub fn level_percent(&self) -> Option<f64> {
        self.total_iterations
            .filter(|&total| total > 0)
            .map(|total| 100.0 * self.iteration as f64 / total as f64)
    }

    /// Whether this is the last scheduled iteration of its level.
    pub fn is_level_end(&self) -> bool {
        self.total_iterations == Some(self.iteration)
    }

    /// Fill `estimated_remaining` from the time spent in the level so far.
    pub(crate) fn estimate_remaining(&mut self, level_elapsed: Duration) {
        let (Some(total), true) = (self.total_iterations, self.iteration > 0) else {
            return;
        };
        let per_step = level_elapsed.as_secs_f64() / self.iteration as f64;
        let left = total.saturating_sub(self.iteration) as f64;
        self.estimated_remaining = Some(Duration::from_secs_f64(per_step * left));
    }
}

/// Progress callback trait for monitoring registration progress.
pub trait ProgressCallback: Send + Sync {
    /// Called at each iteration with progress information.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called when the driver enters a new stage.
    fn on_stage(&self, _stage: &RegistrationStage) {}

    /// Called when registration starts.
    fn on_start(&self) {}

    /// Called when registration completes successfully.
    fn on_complete(&self, _info: &ProgressInfo) {}

    /// Called when registration fails.
    fn on_error(&self, _error: &str) {}
}

/// Console progress callback that logs to tracing.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 50 }
    }
}

impl ConsoleProgressCallback {
    /// Create a new console progress callback.
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }

    /// Iterations between log lines; the last iteration of a level is always logged.
    pub fn log_interval(&self) -> usize {
        self.log_interval
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.iteration % self.log_interval.max(1) != 0 && !info.is_level_end() {
            return;
        }
        tracing::info!(
            level = info.level,
            iteration = info.iteration,
            percent = info.level_percent().unwrap_or(0.0),
            ssd = info.loss,
            lr = info.learning_rate,
            eta_s = info.estimated_remaining.map(|d| d.as_secs_f64()),
            "{}",
            info.params
        );
    }

    fn on_stage(&self, stage: &RegistrationStage) {
        tracing::info!("Stage: {}", stage);
    }

    fn on_start(&self) {
        tracing::info!("Registration started");
    }

    fn on_complete(&self, info: &ProgressInfo) {
        tracing::info!(
            "Registration completed in {:.2}s with final SSD: {:.6}",
            info.elapsed.as_secs_f64(),
            info.loss
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Registration failed: {}", error);
    }
}

/// History callback that records all progress information and stages.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
    stages: Arc<Mutex<Vec<RegistrationStage>>>,
}

impl HistoryCallback {
    /// Create a new history callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded iterations.
    pub fn get_history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Get the recorded stages in the order they were entered.
    pub fn get_stages(&self) -> Vec<RegistrationStage> {
        lock(&self.stages).clone()
    }

    /// Clear the history.
    pub fn clear(&self) {
        lock(&self.history).clear();
        lock(&self.stages).clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        lock(&self.history).push(info.clone());
    }

    fn on_stage(&self, stage: &RegistrationStage) {
        lock(&self.stages).push(*stage);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Clock {
    run: Option<Instant>,
    level: Option<(usize, Instant)>,
}

/// Progress tracker that fans events out to multiple callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    clock: Arc<Mutex<Clock>>,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    fn elapsed(&self) -> Duration {
        let clock = *lock(&self.clock);
        clock.run.map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// Time spent in `level`; the level clock restarts when the level changes.
    fn level_elapsed(&self, level: usize) -> Duration {
        let mut clock = lock(&self.clock);
        match clock.level {
            Some((current, since)) if current == level => since.elapsed(),
            _ => {
                clock.level = Some((level, Instant::now()));
                Duration::ZERO
            }
        }
    }

    /// Start tracking.
    pub fn start(&self) {
        *lock(&self.clock) = Clock {
            run: Some(Instant::now()),
            level: None,
        };
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    /// Report a stage transition.
    pub fn stage(&self, stage: &RegistrationStage) {
        for callback in &self.callbacks {
            callback.on_stage(stage);
        }
    }

    /// Report an iteration; elapsed and remaining time are filled in here.
    pub fn update(&self, mut info: ProgressInfo) {
        if self.callbacks.is_empty() {
            return;
        }
        info.elapsed = self.elapsed();
        let level_elapsed = self.level_elapsed(info.level);
        info.estimate_remaining(level_elapsed);

        for callback in &self.callbacks {
            callback.on_progress(&info);
        }
    }

    /// Complete tracking.
    pub fn complete(&self, final_loss: f64, learning_rate: f64, params: SimilarityParams) {
        let info = ProgressInfo::new(0, None, final_loss, self.elapsed(), learning_rate)
            .with_params(params);

        for callback in &self.callbacks {
            callback.on_complete(&info);
        }
    }

    /// Report error.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}
