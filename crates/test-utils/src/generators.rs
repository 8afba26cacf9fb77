//! Synthetic power-density distributions with analytically known metrics.
//!
//! Every generator returns a square or rectangular [`Grid`] in row-major
//! order. Beams are centered on pixel `(n / 2, n / 2)` so that the
//! centroid is an exact integer.

use beam_common::Grid;

fn grid_from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Grid {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push(f(row, col));
        }
    }
    Grid::new(data, rows, cols).expect("generator produces a consistent shape")
}

/// Creates a rotationally symmetric Gaussian beam.
///
/// Cell `(x, y)` holds `peak · exp(-((x - c)² + (y - c)²) / (2σ²))` with
/// `c = n / 2`. The second-moment width of the beam is `4σ` on both axes
/// and its total power is close to `2π σ² · peak` when the beam fits well
/// inside the grid.
///
/// # Example
///
/// ```
/// use test_utils::create_gaussian_beam;
///
/// let grid = create_gaussian_beam(64, 1000.0, 8.0);
/// assert_eq!(grid.get(32, 32), Some(1000.0));
/// ```
pub fn create_gaussian_beam(n: usize, peak: f64, sigma: f64) -> Grid {
    let center = (n / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    grid_from_fn(n, n, |x, y| {
        let r2 = (x as f64 - center).powi(2) + (y as f64 - center).powi(2);
        peak * (-r2 / two_sigma_sq).exp()
    })
}

/// Creates an ideal flat-top beam: a `block x block` square of constant
/// `intensity` centered in an `n x n` grid of zeros.
///
/// # Example
///
/// ```
/// use test_utils::create_flat_top_beam;
///
/// let grid = create_flat_top_beam(10, 4, 200.0);
/// assert_eq!(grid.valid_values().filter(|&v| v > 0.0).count(), 16);
/// ```
pub fn create_flat_top_beam(n: usize, block: usize, intensity: f64) -> Grid {
    let start = (n - block.min(n)) / 2;
    let end = start + block.min(n);
    grid_from_fn(n, n, |x, y| {
        if (start..end).contains(&x) && (start..end).contains(&y) {
            intensity
        } else {
            0.0
        }
    })
}

/// Creates an elliptical Gaussian beam with different widths per axis.
///
/// `sigma_row` applies along the row index, `sigma_col` along the column
/// index.
pub fn create_elliptical_beam(n: usize, peak: f64, sigma_row: f64, sigma_col: f64) -> Grid {
    let center = (n / 2) as f64;
    grid_from_fn(n, n, |x, y| {
        let dx = (x as f64 - center) / sigma_row;
        let dy = (y as f64 - center) / sigma_col;
        peak * (-(dx * dx + dy * dy) / 2.0).exp()
    })
}

/// Adds a constant background level to every cell of a grid.
pub fn with_background(grid: &Grid, level: f64) -> Grid {
    grid.map(|v| v + level)
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(rows: usize, cols: usize, value: f64) -> Grid {
    Grid::filled(rows, cols, value)
}

/// Creates a grid of `value` with NaN at the given `(row, col)` positions.
///
/// Positions outside the grid are ignored.
pub fn create_grid_with_nans(
    rows: usize,
    cols: usize,
    value: f64,
    nan_positions: &[(usize, usize)],
) -> Grid {
    grid_from_fn(rows, cols, |x, y| {
        if nan_positions.contains(&(x, y)) {
            f64::NAN
        } else {
            value
        }
    })
}
