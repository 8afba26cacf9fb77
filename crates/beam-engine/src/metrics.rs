//! The result record of one analysis run.

use serde::{Deserialize, Serialize};

/// Every scalar produced by one analysis run.
///
/// Fields are grouped in the order they are computed: user inputs,
/// preprocessing, measured quantities, ISO parameters, non-ISO parameters.
/// Widths, centers and areas are in pixels; densities and powers in
/// detector ADC counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamMetrics {
    // User inputs
    pub eta: f64,
    pub epsilon: f64,
    pub mix_count: usize,

    // Preprocessing (mm/pixel)
    pub x_resolution: f64,
    pub y_resolution: f64,

    // Measured quantities
    pub max_power_density: f64,
    pub total_power: f64,
    pub power_density_eta: f64,
    pub power_eta: f64,

    // ISO 13694 / ISO 11145
    pub fractional_power_eta: f64,
    pub center_x: i64,
    pub center_y: i64,
    pub width_x: f64,
    pub width_y: f64,
    pub aspect_ratio: f64,
    pub irradiation_area_eta: usize,
    pub irradiation_area_epsilon: usize,
    pub average_power_density_eta: f64,
    pub flatness_factor_eta: f64,
    pub beam_uniformity_eta: f64,
    pub plateau_uniformity_eta: f64,
    pub edge_steepness_eta: f64,

    // Non-ISO
    pub width_x_eta: f64,
    pub width_y_eta: f64,
    pub edge_x_epsilon_eta: f64,
    pub edge_y_epsilon_eta: f64,
    pub mod_plateau_uniformity_eta: f64,
    pub top_hat_factor: f64,
}

impl BeamMetrics {
    /// Centroid in millimeters.
    pub fn center_mm(&self) -> (f64, f64) {
        (
            self.center_x as f64 * self.x_resolution,
            self.center_y as f64 * self.y_resolution,
        )
    }

    /// Second-moment widths in millimeters.
    pub fn width_mm(&self) -> (f64, f64) {
        (
            self.width_x * self.x_resolution,
            self.width_y * self.y_resolution,
        )
    }
}
