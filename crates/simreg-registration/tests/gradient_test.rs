use burn_ndarray::NdArray;
use simreg_core::filter::warp;
use simreg_core::{phantom, SimilarityParams};
use simreg_registration::gradient::FiniteDifferenceGradient;
use simreg_registration::metric::SumOfSquaredDifferences;
use simreg_registration::ParameterMask;

type B = NdArray<f64>;

#[test]
fn test_step_against_gradient_does_not_increase_cost() {
    let device = Default::default();
    let fixed = phantom::asymmetric_blobs::<B>([32, 32], &device);
    let moving = warp(&fixed, &SimilarityParams::new(1.05, 0.05, 1.0, -1.0), [32, 32], 0.0).unwrap();

    let ssd = SumOfSquaredDifferences::new();
    let estimator = FiniteDifferenceGradient::default();
    let starts = [
        SimilarityParams::new(1.0, 0.0, 0.0, 0.0),
        SimilarityParams::new(0.95, 0.1, 1.0, 0.5),
        SimilarityParams::new(1.08, -0.07, -1.5, 2.0),
        SimilarityParams::new(0.9, 0.2, 0.3, -0.8),
        SimilarityParams::new(1.12, -0.15, 2.2, 1.1),
        SimilarityParams::new(1.02, 0.03, -0.4, -2.5),
    ];
    let h = 1e-3;

    let mut total_change = 0.0;
    let mut samples = 0;
    for start in &starts {
        let base = ssd.evaluate(&fixed, &moving, start).unwrap();
        let grad = estimator
            .compute(|p| ssd.evaluate(&fixed, &moving, p), start, &ParameterMask::all())
            .unwrap();

        for (i, g) in grad.iter().enumerate() {
            let mut values = start.to_array();
            values[i] -= h * g.signum();
            let moved = ssd
                .evaluate(&fixed, &moving, &SimilarityParams::from_array(values))
                .unwrap();
            total_change += moved - base;
            samples += 1;
        }
    }

    assert_eq!(samples, 24);
    assert!(total_change / samples as f64 <= 0.0, "mean change {}", total_change / samples as f64);
}

#[test]
fn test_gradient_points_back_towards_alignment() {
    let device = Default::default();
    let image = phantom::asymmetric_blobs::<B>([32, 32], &device);
    let ssd = SumOfSquaredDifferences::new();

    // Against itself, pushing the translation positive must be penalised.
    let start = SimilarityParams::new(1.0, 0.0, 1.0, -1.0);
    let grad = FiniteDifferenceGradient::default()
        .compute(|p| ssd.evaluate(&image, &image, p), &start, &ParameterMask::translation_only())
        .unwrap();

    assert!(grad[SimilarityParams::TRANSLATION_X] > 0.0);
    assert!(grad[SimilarityParams::TRANSLATION_Y] < 0.0);
    assert_eq!(grad[SimilarityParams::SCALE], 0.0);
}
