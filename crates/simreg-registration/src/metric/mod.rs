//! Image similarity metrics.

pub mod trait_;
pub mod ssd;

pub use trait_::Metric;
pub use ssd::SumOfSquaredDifferences;
