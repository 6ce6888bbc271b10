//! Demo Registration Example
//!
//! Builds a synthetic phantom, moves it by a known similarity transform and
//! registers it back.
//!
//! Usage:
//!   cargo run --example demo_registration [config.json]
//!
//! The optional JSON file may set any `RegistrationConfig` field; missing
//! fields keep their defaults.

use std::sync::Arc;
use burn_ndarray::NdArray;
use simreg_core::filter::warp;
use simreg_core::{phantom, SimilarityParams};
use simreg_registration::{ConsoleProgressCallback, MultiResolutionRegistration, RegistrationConfig};

type Backend = NdArray<f64>;

fn main() -> anyhow::Result<()> {
    println!("Similarity Registration Demo");
    println!("============================\n");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str::<RegistrationConfig>(&text)?
        }
        None => RegistrationConfig::default(),
    };
    println!("Configuration: {}", serde_json::to_string_pretty(&config)?);

    let device = Default::default();
    let shape = [64, 64];

    // 1. Synthetic pair
    let fixed = phantom::asymmetric_blobs::<Backend>(shape, &device);
    let known = SimilarityParams::new(1.1, 0.1, 3.0, -2.0);
    let moving = warp(&fixed, &known, shape, 0.0)?;
    println!("Applied transform: {}", known);

    // 2. Register
    let mut driver = MultiResolutionRegistration::new(config)?
        .with_callback(Arc::new(ConsoleProgressCallback::new(100)));
    let result = driver.execute(&fixed, &moving)?;

    // 3. Report
    let expected = known.inverse()?;
    println!("\n--- Ground Truth vs. Optimized Parameters ---");
    println!("Expected:  {}", expected);
    println!("Optimized: {}", result.params);
    for level in &result.levels {
        println!(
            "  level {} {:?} (x{}): cost {:.4} -> {:.4}",
            level.level, level.shape, level.scale_factor, level.first_cost, level.last_cost
        );
    }
    println!(
        "SSD: {:.4} -> {:.4} ({:.1}% reduction, {} iterations)",
        result.initial_ssd,
        result.final_ssd,
        100.0 * result.ssd_reduction(),
        result.cost_history.len()
    );

    Ok(())
}
