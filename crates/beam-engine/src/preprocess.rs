//! Background correction and pixel resolution.

use beam_common::{Axis, BeamError, BeamResult, Grid, Header};

/// Pixel resolution along an axis in millimeters per pixel.
pub fn resolution(header: &Header, axis: Axis) -> BeamResult<f64> {
    let pixels = header.pixels(axis);
    if pixels <= 0 {
        return Err(BeamError::config(format!(
            "pixel count on the {} axis must be > 0, got {}",
            axis, pixels
        )));
    }
    Ok(header.window_mm(axis) / pixels as f64)
}

/// Subtract the header's null point from every cell.
///
/// NaN cells stay NaN and negative results are kept as they are: the noise
/// around the background feeds the RMS-based uniformity metrics.
pub fn correct(grid: &Grid, header: &Header) -> BeamResult<Grid> {
    header.validate()?;

    if grid.rows() as i64 != header.pixels_x || grid.cols() as i64 != header.pixels_y {
        return Err(BeamError::config(format!(
            "grid shape {}x{} does not match header pixel counts {}x{}",
            grid.rows(),
            grid.cols(),
            header.pixels_x,
            header.pixels_y
        )));
    }

    let null_point = header.null_point;
    Ok(grid.map(|v| v - null_point))
}
