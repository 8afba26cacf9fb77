//! Characterizing parameters defined by ISO 13694 and ISO 11145.

use beam_common::{BeamError, BeamResult, Grid};

use crate::config::MixtureFitConfig;
use crate::measured::{clip_level_power, clip_level_power_density, total_power};
use crate::mixture::{self, DensityCurve};

/// Beam aspect ratio `(Dy·Ry) / (Dx·Rx)` from widths in pixels and
/// resolutions in mm/pixel.
pub fn aspect_ratio(width_x: f64, res_x: f64, width_y: f64, res_y: f64) -> BeamResult<f64> {
    let denominator = width_x * res_x;
    if denominator == 0.0 {
        return Err(BeamError::degenerate("aspect ratio undefined: x width is zero"));
    }
    Ok((width_y * res_y) / denominator)
}

/// Fraction of the total power carried by cells at or above the clip level.
///
/// 1.0 for an ideal flat-top beam.
pub fn fractional_power(grid: &Grid, clip: f64) -> BeamResult<f64> {
    let total = total_power(grid);
    if total == 0.0 {
        return Err(BeamError::degenerate("fractional power undefined: total power is zero"));
    }
    Ok(clip_level_power(grid, clip) / total)
}

/// Number of cells strictly above the clip-level power density.
pub fn irradiation_area(grid: &Grid, clip: f64) -> usize {
    let threshold = clip_level_power_density(grid, clip);
    grid.valid_values().filter(|&v| v > threshold).count()
}

/// Average power density `power / area`.
pub fn average_power_density(power: f64, area: usize) -> BeamResult<f64> {
    if area == 0 {
        return Err(BeamError::degenerate(
            "average power density undefined: irradiation area is zero",
        ));
    }
    Ok(power / area as f64)
}

/// Flatness factor: average over maximum power density.
///
/// 1.0 for an ideal flat-top beam.
pub fn flatness_factor(average_density: f64, max_density: f64) -> BeamResult<f64> {
    if max_density == 0.0 {
        return Err(BeamError::degenerate(
            "flatness factor undefined: maximum power density is zero",
        ));
    }
    Ok(average_density / max_density)
}

/// Beam uniformity: normalized RMS deviation from the average power
/// density over the cells at or above `density_threshold`.
///
/// The sum runs over every row but the last, like the image moments.
/// 0.0 for an ideal flat-top beam.
pub fn beam_uniformity(
    grid: &Grid,
    average_density: f64,
    area: usize,
    density_threshold: f64,
) -> BeamResult<f64> {
    if area == 0 || average_density == 0.0 {
        return Err(BeamError::degenerate(format!(
            "beam uniformity undefined for area {} and average density {}",
            area, average_density
        )));
    }

    let mut sum = 0.0;
    for x in 0..grid.rows().saturating_sub(1) {
        for &value in grid.row(x) {
            if value >= density_threshold {
                sum += (value - average_density).powi(2);
            }
        }
    }

    Ok((sum / area as f64).sqrt() / average_density)
}

/// Plateau uniformity: FWHM of the fitted upper-plateau density divided by
/// the maximum power density.
///
/// 0.0 for an ideal flat-top beam.
pub fn plateau_uniformity(
    grid: &Grid,
    max_density: f64,
    mix_count: usize,
    config: &MixtureFitConfig,
) -> BeamResult<f64> {
    let curve = mixture::fit_grid(grid, mix_count, config)?;
    plateau_uniformity_from(&curve, max_density)
}

/// [`plateau_uniformity`] from an already fitted density curve.
pub fn plateau_uniformity_from(curve: &DensityCurve, max_density: f64) -> BeamResult<f64> {
    if max_density == 0.0 {
        return Err(BeamError::degenerate(
            "plateau uniformity undefined: maximum power density is zero",
        ));
    }
    Ok(curve.full_width_half_maximum() / max_density)
}

/// Edge steepness `(area1 - area2) / area1` between the lower clip-level
/// area `area1` and the upper clip-level area `area2`.
///
/// 0.0 for perfectly vertical edges.
pub fn edge_steepness(area1: usize, area2: usize) -> BeamResult<f64> {
    if area1 < area2 {
        return Err(BeamError::invariant(format!(
            "lower clip-level area ({}) is smaller than upper clip-level area ({})",
            area1, area2
        )));
    }
    if area1 == 0 {
        return Err(BeamError::degenerate("edge steepness undefined: both areas are zero"));
    }
    Ok((area1 - area2) as f64 / area1 as f64)
}
