//! Optimizers for the similarity parameter vector.
//!
//! Optimizers are stateless values; the per-run state they need is an
//! explicit [`Optimizer::State`] passed into and returned from every step,
//! so the caller decides what survives between pyramid levels.
//!
//! # Examples
//!
//! ```rust
//! use simreg_core::SimilarityParams;
//! use simreg_registration::optimizer::{AdamOptimizer, Optimizer};
//!
//! let optimizer = AdamOptimizer::new(0.01);
//! let state = optimizer.init_state();
//! let (params, state) = optimizer.step(&SimilarityParams::identity(), &[1.0, 0.0, 0.0, 0.0], state);
//! assert!(params.scale < 1.0);
//! assert_eq!(state.step, 1);
//! ```

pub mod trait_;
pub mod adam;

pub use trait_::Optimizer;
pub use adam::{AdamConfig, AdamOptimizer, AdamState};
