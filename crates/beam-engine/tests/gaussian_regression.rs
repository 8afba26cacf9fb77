//! Regression against a synthetic 256 x 256 Gaussian beam.
//!
//! The beam peaks at 1000 ADC on pixel (128, 128) with σ chosen so that
//! the D4σ width is 116.133 px, the reference width of the lab fixture.

use std::f64::consts::PI;

use beam_engine::{analyze, AnalysisConfig};
use test_utils::{
    assert_approx_eq, assert_pair_approx_eq, create_gaussian_beam, square_header, with_background,
};

const N: usize = 256;
const PEAK: f64 = 1000.0;
const WIDTH: f64 = 116.133;
const SIGMA: f64 = WIDTH / 4.0;

#[test]
fn test_gaussian_reference_metrics() {
    let grid = create_gaussian_beam(N, PEAK, SIGMA);
    let header = square_header(N, 5.12, 0.0);
    let m = analyze(&grid, &header, &AnalysisConfig::default())
        .unwrap()
        .metrics;

    assert_eq!(m.eta, 0.8);
    assert_eq!(m.epsilon, 0.1);
    assert_eq!(m.mix_count, 1);
    assert_eq!(m.max_power_density, PEAK);
    assert_eq!((m.center_x, m.center_y), (128, 128));
    assert_eq!(m.aspect_ratio, 1.0);

    // Only the far tails (beyond ~4.4σ) are cut off by the grid.
    let expected_power = 2.0 * PI * SIGMA * SIGMA * PEAK;
    assert_approx_eq!(m.total_power / expected_power, 1.0, 1e-3);
    assert_pair_approx_eq!((m.width_x, m.width_y), (WIDTH, WIDTH), 0.05);

    let (wx_mm, wy_mm) = m.width_mm();
    assert_pair_approx_eq!((wx_mm, wy_mm), (WIDTH * 0.02, WIDTH * 0.02), 0.001);
    let (cx_mm, cy_mm) = m.center_mm();
    assert_pair_approx_eq!((cx_mm, cy_mm), (2.56, 2.56), 1e-12);
}

#[test]
fn test_clip_level_relations() {
    let grid = create_gaussian_beam(N, PEAK, SIGMA);
    let m = analyze(&grid, &square_header(N, 5.12, 0.0), &AnalysisConfig::default())
        .unwrap()
        .metrics;

    assert_eq!(m.power_density_eta, 800.0);
    assert!(m.irradiation_area_epsilon > m.irradiation_area_eta);
    assert!(m.edge_steepness_eta > 0.0 && m.edge_steepness_eta < 1.0);

    // A Gaussian exceeds η·peak within r = σ·sqrt(-2 ln η).
    let radius = SIGMA * (-2.0 * 0.8f64.ln()).sqrt();
    let expected_area = PI * radius * radius;
    assert_approx_eq!(m.irradiation_area_eta as f64 / expected_area, 1.0, 0.05);
    assert!(m.width_x_eta > 0.0 && m.width_x_eta <= 2.0 * radius + 1.0);
    assert!(m.edge_x_epsilon_eta > 0.0);
}

#[test]
fn test_background_correction() {
    let clean = create_gaussian_beam(N, PEAK, SIGMA);
    let noisy = with_background(&clean, 250.0);

    let reference = analyze(&clean, &square_header(N, 5.12, 0.0), &AnalysisConfig::default())
        .unwrap()
        .metrics;
    let corrected = analyze(&noisy, &square_header(N, 5.12, 250.0), &AnalysisConfig::default())
        .unwrap()
        .metrics;

    assert_eq!(
        (corrected.center_x, corrected.center_y),
        (reference.center_x, reference.center_y)
    );
    assert_approx_eq!(corrected.width_x, reference.width_x, 1e-3);
    assert_approx_eq!(corrected.total_power, reference.total_power, 1e-6 * reference.total_power);
    assert_eq!(corrected.irradiation_area_eta, reference.irradiation_area_eta);
}
