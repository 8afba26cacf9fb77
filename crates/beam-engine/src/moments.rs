//! Discrete image moments, beam centroid and second-moment beam width.
//!
//! `M(p, q, x0, y0) = Σx Σy (x - x0)^p (y - y0)^q f(x, y)` over row index
//! `x` and column index `y`. The sums run over `0..rows-1` and `0..cols-1`:
//! the last row and the last column never contribute. Reference outputs
//! depend on this bound, so it is kept as is.
//!
//! NaN cells are treated as missing and skipped.

use beam_common::{BeamError, BeamResult, Grid};

/// Width returned when the distribution has no power (`M(0,0) == 0`).
pub const UNDEFINED_WIDTH: (f64, f64) = (-1.0, -1.0);

/// Discrete image moment of order `(p, q)` about `(x0, y0)`.
pub fn moment(grid: &Grid, p: i32, q: i32, x0: f64, y0: f64) -> f64 {
    let mut sum = 0.0;
    for x in 0..grid.rows().saturating_sub(1) {
        let row = grid.row(x);
        let wx = (x as f64 - x0).powi(p);
        for (y, &value) in row.iter().enumerate().take(grid.cols().saturating_sub(1)) {
            if value.is_nan() {
                continue;
            }
            sum += wx * (y as f64 - y0).powi(q) * value;
        }
    }
    sum
}

/// Marginal sums of a grid over the moment summation region.
///
/// Any moment with `q == 0` (or `p == 0`) only needs the row (or column)
/// marginal, so one pass over the grid serves every such order and
/// reference point.
#[derive(Debug, Clone)]
pub struct MomentProfiles {
    /// `row_sums[x] = Σy f(x, y)`.
    row_sums: Vec<f64>,
    /// `col_sums[y] = Σx f(x, y)`.
    col_sums: Vec<f64>,
}

impl MomentProfiles {
    /// Accumulate the marginals in a single pass.
    pub fn accumulate(grid: &Grid) -> Self {
        let n_rows = grid.rows().saturating_sub(1);
        let n_cols = grid.cols().saturating_sub(1);
        let mut row_sums = vec![0.0; n_rows];
        let mut col_sums = vec![0.0; n_cols];

        for (x, row_sum) in row_sums.iter_mut().enumerate() {
            for (y, &value) in grid.row(x).iter().enumerate().take(n_cols) {
                if value.is_nan() {
                    continue;
                }
                *row_sum += value;
                col_sums[y] += value;
            }
        }

        Self { row_sums, col_sums }
    }

    /// Zeroth-order moment `M(0,0)`.
    pub fn m00(&self) -> f64 {
        self.row_sums.iter().sum()
    }

    /// `M(p, 0, x0, ·)`.
    pub fn moment_x(&self, p: i32, x0: f64) -> f64 {
        weighted(&self.row_sums, p, x0)
    }

    /// `M(0, q, ·, y0)`.
    pub fn moment_y(&self, q: i32, y0: f64) -> f64 {
        weighted(&self.col_sums, q, y0)
    }
}

fn weighted(profile: &[f64], order: i32, origin: f64) -> f64 {
    profile
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 - origin).powi(order) * s)
        .sum()
}

/// Beam centroid `(round(M10/M00), round(M01/M00))` in pixels.
///
/// Rounds half to even. Fails when the distribution carries no power.
pub fn centroid(grid: &Grid) -> BeamResult<(i64, i64)> {
    centroid_from(&MomentProfiles::accumulate(grid))
}

pub(crate) fn centroid_from(profiles: &MomentProfiles) -> BeamResult<(i64, i64)> {
    let m00 = profiles.m00();
    if m00 == 0.0 || !m00.is_finite() {
        return Err(BeamError::degenerate(format!(
            "centroid undefined: zeroth moment is {}",
            m00
        )));
    }
    let cx = profiles.moment_x(1, 0.0) / m00;
    let cy = profiles.moment_y(1, 0.0) / m00;
    Ok((cx.round_ties_even() as i64, cy.round_ties_even() as i64))
}

/// Second-moment beam width `4·sqrt(M20(x̄)/M00)` per axis, in pixels,
/// rounded to 4 decimal digits.
///
/// Returns [`UNDEFINED_WIDTH`] when `M(0,0)` is zero. A negative second
/// moment (background noise dominating the signal) is reported as
/// degenerate input.
pub fn width(grid: &Grid, center: (i64, i64)) -> BeamResult<(f64, f64)> {
    width_from(&MomentProfiles::accumulate(grid), center)
}

pub(crate) fn width_from(profiles: &MomentProfiles, center: (i64, i64)) -> BeamResult<(f64, f64)> {
    let m00 = profiles.m00();
    if m00 == 0.0 {
        return Ok(UNDEFINED_WIDTH);
    }

    let m2x = profiles.moment_x(2, center.0 as f64);
    let m2y = profiles.moment_y(2, center.1 as f64);
    Ok((axis_width(m2x, m00)?, axis_width(m2y, m00)?))
}

fn axis_width(second_moment: f64, m00: f64) -> BeamResult<f64> {
    let variance = second_moment / m00;
    if !(variance >= 0.0) || !variance.is_finite() {
        return Err(BeamError::degenerate(format!(
            "beam width undefined: normalized second moment is {}",
            variance
        )));
    }
    Ok(round_to(4.0 * variance.sqrt(), 4))
}

/// Round half to even at `digits` decimal places.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}
