//! Raster power-density grid.

use crate::error::{BeamError, BeamResult};

/// An immutable 2-D grid of intensity samples in detector ADC counts.
///
/// Values are stored row-major. The row index maps to the x-axis and the
/// column index to the y-axis; NaN marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Create a grid from row-major data.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> BeamResult<Self> {
        if data.len() != rows * cols {
            return Err(BeamError::config(format!(
                "grid data has {} samples, expected {} x {} = {}",
                data.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a grid from a list of equally long rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> BeamResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(BeamError::config(format!(
                "row {} has {} samples, expected {}",
                i,
                row.len(),
                n_cols
            )));
        }
        let data = rows.into_iter().flatten().collect();
        Self::new(data, n_rows, n_cols)
    }

    /// Create a grid filled with a constant value.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Number of rows (x pixels).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (y pixels).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells, including NaN cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of all cells.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Get the value at a grid position.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Slice of one row.
    ///
    /// Panics if `row` is out of range.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterate over the cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(col).step_by(self.cols.max(1)).copied()
    }

    /// Iterate over the non-NaN cells.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }

    /// Swap rows and columns.
    ///
    /// Per-axis computations are written once against rows and reused for
    /// the other axis through this.
    pub fn transposed(&self) -> Grid {
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..self.cols {
            data.extend(self.column(col));
        }
        Grid {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Apply a function to every cell, producing a new grid.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            data: self.data.iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}
