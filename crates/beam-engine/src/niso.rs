//! Characterizing parameters with common non-ISO definitions.
//!
//! The clip-level widths count pixels per column of the grid they are
//! given; pass the transposed grid to measure along the other axis.

use beam_common::{BeamError, BeamResult, Grid};

use crate::config::MixtureFitConfig;
use crate::energy::EnergyTable;
use crate::measured::clip_level_power_density;
use crate::mixture::{self, DensityCurve};

/// Number of outlier-rejection passes applied to the per-column counts.
const REJECTION_PASSES: usize = 2;

/// Largest absolute z-score kept by each rejection pass.
const MAX_Z_SCORE: f64 = 1.0;

/// Clip-level beam width in pixels: the robust mean over columns of the
/// number of cells strictly above the clip-level power density.
pub fn clip_level_width(grid: &Grid, clip: f64) -> f64 {
    let threshold = clip_level_power_density(grid, clip);
    robust_mean(column_counts(grid, |v| v > threshold))
}

/// Clip-level edge width in pixels: half the robust mean over columns of
/// the number of cells strictly between the lower and upper clip-level
/// power densities.
pub fn clip_level_edge_width(grid: &Grid, clip_low: f64, clip_high: f64) -> f64 {
    let low = clip_level_power_density(grid, clip_low);
    let high = clip_level_power_density(grid, clip_high);
    robust_mean(column_counts(grid, |v| v > low && v < high)) / 2.0
}

/// Modified plateau uniformity: FWHM of the fitted upper-plateau density
/// divided by the intensity at which that density peaks.
pub fn modified_plateau_uniformity(
    grid: &Grid,
    mix_count: usize,
    config: &MixtureFitConfig,
) -> BeamResult<f64> {
    let curve = mixture::fit_grid(grid, mix_count, config)?;
    modified_plateau_uniformity_from(&curve)
}

/// [`modified_plateau_uniformity`] from an already fitted density curve.
pub fn modified_plateau_uniformity_from(curve: &DensityCurve) -> BeamResult<f64> {
    let peak = curve
        .peak_position()
        .ok_or_else(|| BeamError::degenerate("fitted density curve is empty"))?;
    if peak == 0.0 {
        return Err(BeamError::degenerate(
            "modified plateau uniformity undefined: fitted peak lies at zero",
        ));
    }
    Ok(curve.full_width_half_maximum() / peak)
}

/// Top-hat factor: area under the normalized cumulative-energy curve over
/// the area of the ideal 100 x 100 square.
///
/// 1.0 for an ideal flat-top beam.
pub fn top_hat_factor(table: &EnergyTable) -> BeamResult<f64> {
    if table.is_empty() {
        return Err(BeamError::degenerate("top-hat factor undefined: empty energy table"));
    }
    let step = 100.0 / table.len() as f64;
    let area: f64 = table
        .bins
        .iter()
        .map(|b| b.normalized_cumulative_energy)
        .sum::<f64>()
        * step;
    Ok(area / 10_000.0)
}

fn column_counts(grid: &Grid, pred: impl Fn(f64) -> bool) -> Vec<usize> {
    (0..grid.cols())
        .map(|col| grid.column(col).filter(|&v| pred(v)).count())
        .collect()
}

/// Mean of the nonzero counts after the two-pass z-score rejection.
///
/// Each pass keeps the counts with |z| <= 1, where a NaN z-score (all
/// counts equal) counts as 1. If a pass leaves nothing, the result is 0.
fn robust_mean(counts: Vec<usize>) -> f64 {
    let mut retained: Vec<f64> = counts
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| c as f64)
        .collect();

    for _ in 0..REJECTION_PASSES {
        let scores = z_scores(&retained);
        retained = retained
            .iter()
            .zip(scores)
            .filter(|(_, z)| *z <= MAX_Z_SCORE)
            .map(|(&c, _)| c)
            .collect();

        if retained.is_empty() {
            retained.push(0.0);
            break;
        }
    }

    retained.iter().sum::<f64>() / retained.len() as f64
}

/// Absolute z-scores with the population standard deviation; NaN scores
/// are replaced by 1.
fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    values
        .iter()
        .map(|v| {
            let z = ((v - mean) / std).abs();
            if z.is_nan() {
                1.0
            } else {
                z
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::EnergyBin;

    #[test]
    fn test_robust_mean_equal_counts() {
        assert_eq!(robust_mean(vec![0, 4, 4, 4, 0]), 4.0);
    }

    #[test]
    fn test_robust_mean_rejects_outliers() {
        // Pass 1: mean 5.2, std ~3.6; 12 is rejected. Pass 2: every |z| is exactly 1.
        assert_eq!(robust_mean(vec![3, 3, 4, 4, 12]), 3.5);
    }

    #[test]
    fn test_robust_mean_of_nothing_is_zero() {
        assert_eq!(robust_mean(vec![0, 0, 0]), 0.0);
        assert_eq!(robust_mean(Vec::new()), 0.0);
    }

    #[test]
    fn test_z_scores_nan_replaced() {
        assert_eq!(z_scores(&[2.0, 2.0]), vec![1.0, 1.0]);
        assert_eq!(z_scores(&[1.0, 3.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_clip_level_width_counts_columns() {
        // Columns 1..=3 carry a 2-cell-tall block above the threshold.
        let grid = Grid::from_rows(vec![
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 10.0, 10.0, 10.0, 0.0],
            vec![0.0, 10.0, 10.0, 10.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        assert_eq!(clip_level_width(&grid, 0.5), 2.0);
        assert_eq!(clip_level_width(&grid.transposed(), 0.5), 3.0);
        assert_eq!(clip_level_width(&grid, 1.0), 0.0);
    }

    #[test]
    fn test_clip_level_edge_width() {
        // Per column: two cells strictly between 1 and 9.
        let grid = Grid::from_rows(vec![
            vec![0.0, 0.0],
            vec![5.0, 5.0],
            vec![10.0, 10.0],
            vec![5.0, 5.0],
            vec![0.0, 0.0],
        ])
        .unwrap();
        assert_eq!(clip_level_edge_width(&grid, 0.1, 0.9), 1.0);
    }

    #[test]
    fn test_modified_plateau_uniformity_of_uniform_plateau() {
        let values: Vec<f64> = (0..=1000).map(f64::from).collect();
        let grid = Grid::new(values, 1, 1001).unwrap();
        let config = MixtureFitConfig::default();

        // Single normal centered on the plateau 500..=1000.
        let curve = mixture::fit_grid(&grid, 1, &config).unwrap();
        let peak = curve.peak_position().unwrap();
        assert!((peak - 750.0).abs() < 0.1, "peak at {}", peak);

        // FWHM 2.3548 * 501 / sqrt(12) over a peak at 750.
        let u = modified_plateau_uniformity(&grid, 1, &config).unwrap();
        assert!((u - 0.4541).abs() < 1e-3, "{}", u);
        assert_eq!(modified_plateau_uniformity_from(&curve).unwrap(), u);
    }

    #[test]
    fn test_top_hat_factor_of_square_curve() {
        let bins = (0..4)
            .map(|i| EnergyBin {
                intensity: i,
                count: 1,
                energy: 0.0,
                cumulative_energy: 1.0,
                normalized_cumulative_energy: 100.0,
                normalized_intensity: 0.0,
            })
            .collect();
        let table = EnergyTable {
            lower_limit: 0,
            bins,
        };
        assert!((top_hat_factor(&table).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_hat_factor_empty_table() {
        let table = EnergyTable {
            lower_limit: 0,
            bins: Vec::new(),
        };
        assert!(top_hat_factor(&table).is_err());
    }
}
