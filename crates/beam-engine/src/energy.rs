//! Cumulative-energy table behind the top-hat factor.
//!
//! Samples are histogrammed by integer intensity. The most frequent
//! intensity (`lower_limit`) is taken as the floor: every bin above it
//! carries `count · (intensity - lower_limit)` of energy. The reverse
//! cumulative sum of that energy, normalized to 0..100, plotted against the
//! intensity normalized to 0..100, is the normalized energy curve.

use std::collections::BTreeMap;

use beam_common::{BeamError, BeamResult, Grid};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the number of contiguous intensity bins.
const MAX_BINS: i64 = 1 << 24;

/// One contiguous intensity bin of the energy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBin {
    /// Integer intensity of the bin in ADC counts.
    pub intensity: i64,
    /// Number of samples in the bin.
    pub count: u64,
    /// `count · (intensity - lower_limit)`.
    pub energy: f64,
    /// Sum of the energy of this bin and every bin above it.
    pub cumulative_energy: f64,
    /// Cumulative energy scaled to 0..100.
    pub normalized_cumulative_energy: f64,
    /// Intensity scaled to 0..100 over the bin range.
    pub normalized_intensity: f64,
}

/// Normalized cumulative-energy curve of a power-density distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyTable {
    /// Intensity with the highest sample count.
    pub lower_limit: i64,
    /// Bins from `lower_limit` to the highest intensity, without gaps.
    pub bins: Vec<EnergyBin>,
}

impl EnergyTable {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Check if the table has no bins.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Integer bin of a sample, or `None` when it cannot be binned.
fn intensity_bin(value: f64) -> Option<i64> {
    let rounded = value.round();
    // i64::MAX is not representable; 2^63 is the first value out of range.
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Build the cumulative-energy table of a grid. NaN cells are ignored;
/// infinite samples or samples beyond the `i64` range are rejected.
pub fn build_energy_table(grid: &Grid) -> BeamResult<EnergyTable> {
    let mut histogram: BTreeMap<i64, u64> = BTreeMap::new();
    for value in grid.valid_values() {
        let bin = intensity_bin(value).ok_or_else(|| {
            BeamError::degenerate(format!("sample {} cannot be binned by intensity", value))
        })?;
        *histogram.entry(bin).or_insert(0) += 1;
    }

    // First (lowest) bin wins ties.
    let mut mode: Option<(i64, u64)> = None;
    for (&bin, &count) in &histogram {
        match mode {
            Some((_, best)) if count <= best => {}
            _ => mode = Some((bin, count)),
        }
    }
    let (lower_limit, _) = mode.ok_or_else(|| BeamError::degenerate("no valid samples"))?;
    let upper_limit = histogram.keys().next_back().copied().unwrap_or(lower_limit);

    let span = match upper_limit.checked_sub(lower_limit) {
        Some(span) if span < MAX_BINS => span,
        _ => {
            return Err(BeamError::degenerate(format!(
                "intensity range {}..={} is too wide for an energy table",
                lower_limit, upper_limit
            )))
        }
    };

    let mut bins: Vec<EnergyBin> = (lower_limit..=upper_limit)
        .map(|intensity| {
            let count = histogram.get(&intensity).copied().unwrap_or(0);
            EnergyBin {
                intensity,
                count,
                energy: count as f64 * (intensity - lower_limit) as f64,
                cumulative_energy: 0.0,
                normalized_cumulative_energy: 0.0,
                normalized_intensity: 0.0,
            }
        })
        .collect();

    let mut running = 0.0;
    for bin in bins.iter_mut().rev() {
        running += bin.energy;
        bin.cumulative_energy = running;
    }

    let max_cumulative = bins
        .iter()
        .map(|b| b.cumulative_energy)
        .fold(0.0, f64::max);
    if max_cumulative == 0.0 {
        return Err(BeamError::degenerate(
            "energy curve undefined: no power above the most frequent intensity",
        ));
    }

    for bin in bins.iter_mut() {
        bin.normalized_cumulative_energy = 100.0 * bin.cumulative_energy / max_cumulative;
        bin.normalized_intensity = 100.0 * (bin.intensity - lower_limit) as f64 / span as f64;
    }

    debug!(
        lower_limit,
        upper_limit,
        bins = bins.len(),
        "Built cumulative energy table"
    );

    Ok(EnergyTable { lower_limit, bins })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns() {
        // Mode at 0 (five samples), then one sample at 2 and two at 4.
        let grid = Grid::from_rows(vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 2.0, 4.0, 4.0],
        ])
        .unwrap();
        let table = build_energy_table(&grid).unwrap();

        assert_eq!(table.lower_limit, 0);
        let intensities: Vec<i64> = table.bins.iter().map(|b| b.intensity).collect();
        assert_eq!(intensities, vec![0, 1, 2, 3, 4]);

        let counts: Vec<u64> = table.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![5, 0, 1, 0, 2]);

        let energy: Vec<f64> = table.bins.iter().map(|b| b.energy).collect();
        assert_eq!(energy, vec![0.0, 0.0, 2.0, 0.0, 8.0]);

        let cumulative: Vec<f64> = table.bins.iter().map(|b| b.cumulative_energy).collect();
        assert_eq!(cumulative, vec![10.0, 10.0, 10.0, 8.0, 8.0]);

        let normalized: Vec<f64> = table
            .bins
            .iter()
            .map(|b| b.normalized_cumulative_energy)
            .collect();
        assert_eq!(normalized, vec![100.0, 100.0, 100.0, 80.0, 80.0]);

        let axis: Vec<f64> = table.bins.iter().map(|b| b.normalized_intensity).collect();
        assert_eq!(axis, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_bins_below_mode_are_dropped() {
        let grid = Grid::from_rows(vec![vec![1.0, 3.0, 3.0, 3.0, 7.0, f64::NAN]]).unwrap();
        let table = build_energy_table(&grid).unwrap();
        assert_eq!(table.lower_limit, 3);
        assert_eq!(table.bins.first().map(|b| b.intensity), Some(3));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_mode_ties_pick_lowest_bin() {
        let grid = Grid::from_rows(vec![vec![2.0, 2.0, 5.0, 5.0, 9.0]]).unwrap();
        assert_eq!(build_energy_table(&grid).unwrap().lower_limit, 2);
    }

    #[test]
    fn test_constant_grid_is_degenerate() {
        let grid = Grid::filled(4, 4, 12.0);
        assert!(matches!(
            build_energy_table(&grid),
            Err(BeamError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_huge_range_below_negative_mode_is_degenerate() {
        let grid = Grid::from_rows(vec![vec![-1.0, -1.0, -1.0, 1e19]]).unwrap();
        assert!(matches!(
            build_energy_table(&grid),
            Err(BeamError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_wide_range_is_degenerate() {
        let grid = Grid::from_rows(vec![vec![-5e18, -5e18, 5e18]]).unwrap();
        assert!(matches!(
            build_energy_table(&grid),
            Err(BeamError::DegenerateInput(_))
        ));
        let grid = Grid::from_rows(vec![vec![0.0, 0.0, 2e7]]).unwrap();
        assert!(build_energy_table(&grid).is_err());
    }

    #[test]
    fn test_infinite_sample_is_degenerate() {
        let grid = Grid::from_rows(vec![vec![0.0, 0.0, f64::INFINITY]]).unwrap();
        assert!(matches!(
            build_energy_table(&grid),
            Err(BeamError::DegenerateInput(_))
        ));
        let grid = Grid::from_rows(vec![vec![0.0, 0.0, f64::NEG_INFINITY]]).unwrap();
        assert!(build_energy_table(&grid).is_err());
    }

    #[test]
    fn test_all_nan_is_degenerate() {
        assert!(build_energy_table(&Grid::filled(2, 2, f64::NAN)).is_err());
    }
}
