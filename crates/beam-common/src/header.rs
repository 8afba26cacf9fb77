//! Instrument header accompanying a power-density grid.

use crate::error::{BeamError, BeamResult};
use serde::{Deserialize, Serialize};

/// Detector axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Typed view of the measurement header.
///
/// Positions in the source file are resolved once at load time; the engine
/// only ever sees named fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Number of pixels on the x-axis (grid rows).
    pub pixels_x: i64,
    /// Number of pixels on the y-axis (grid columns).
    pub pixels_y: i64,
    /// Measurement window on the x-axis in millimeters.
    pub window_x_mm: f64,
    /// Measurement window on the y-axis in millimeters.
    pub window_y_mm: f64,
    /// Mean background level in ADC counts.
    pub null_point: f64,
}

impl Header {
    /// Create a new header.
    pub fn new(
        pixels_x: i64,
        pixels_y: i64,
        window_x_mm: f64,
        window_y_mm: f64,
        null_point: f64,
    ) -> Self {
        Self {
            pixels_x,
            pixels_y,
            window_x_mm,
            window_y_mm,
            null_point,
        }
    }

    /// Pixel count along an axis.
    pub fn pixels(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.pixels_x,
            Axis::Y => self.pixels_y,
        }
    }

    /// Window size along an axis in millimeters.
    pub fn window_mm(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.window_x_mm,
            Axis::Y => self.window_y_mm,
        }
    }

    /// Check the header invariants: positive pixel counts and positive,
    /// finite window sizes.
    pub fn validate(&self) -> BeamResult<()> {
        for axis in [Axis::X, Axis::Y] {
            if self.pixels(axis) <= 0 {
                return Err(BeamError::config(format!(
                    "pixel count on the {} axis must be > 0, got {}",
                    axis,
                    self.pixels(axis)
                )));
            }
            let window = self.window_mm(axis);
            if !window.is_finite() || window <= 0.0 {
                return Err(BeamError::config(format!(
                    "window size on the {} axis must be > 0 mm, got {}",
                    axis, window
                )));
            }
        }
        if !self.null_point.is_finite() {
            return Err(BeamError::config("null point must be finite"));
        }
        Ok(())
    }
}
