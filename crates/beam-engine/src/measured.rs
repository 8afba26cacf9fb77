//! Measured quantities (ISO 13694 / ISO 11145).
//!
//! Scalar reductions of the noise-corrected grid that every characterizing
//! parameter is built from. All reductions ignore NaN cells.

use beam_common::Grid;

/// Maximum power density over all cells, ignoring NaN.
///
/// Returns NaN when the grid has no valid cell.
pub fn max_power_density(grid: &Grid) -> f64 {
    grid.valid_values().fold(f64::NAN, f64::max)
}

/// Total power: NaN-safe sum over all cells.
pub fn total_power(grid: &Grid) -> f64 {
    grid.valid_values().sum()
}

/// Clip-level power density: `clip` as a fraction of the maximum density.
pub fn clip_level_power_density(grid: &Grid, clip: f64) -> f64 {
    max_power_density(grid) * clip
}

/// Power of the cells at or above the clip-level power density.
///
/// The threshold is inclusive (`>=`), unlike the strict threshold used by
/// the irradiation area and the clip-level widths.
pub fn clip_level_power(grid: &Grid, clip: f64) -> f64 {
    let threshold = clip_level_power_density(grid, clip);
    grid.valid_values().filter(|&v| v >= threshold).sum()
}
