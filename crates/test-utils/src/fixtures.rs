//! Common test fixtures for beam-profiler tests.
//!
//! Headers, sample detector dumps in the tab-separated profile format, and
//! helpers to write them to temporary files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use beam_common::{Grid, Header};
use tempfile::TempDir;

/// Field positions of the header row.
pub mod layout {
    pub const PIXELS_X: usize = 5;
    pub const PIXELS_Y: usize = 8;
    pub const WINDOW_Y: usize = 11;
    pub const WINDOW_X: usize = 14;
    pub const NULL_POINT: usize = 17;
    /// Number of fields written by [`super::header_row`].
    pub const FIELD_COUNT: usize = 18;
}

/// A tiny 3 x 4 profile with a 2.0 mm x 3.0 mm window and null point 10.
pub const SMALL_PROFILE: &str = "BeamProfile\t1.0\t\t\tPixels X\t3\t\tPixels Y\t4\t\tWindow Y [mm]\t3.0\t\tWindow X [mm]\t2.0\t\tNull point\t10\n\
10\t10\t12\t10\n\
10\t30\t40\t11\n\
10\t12\t10\t10\n";

/// Header of a square detector with `n` pixels per axis.
pub fn square_header(n: usize, window_mm: f64, null_point: f64) -> Header {
    Header::new(n as i64, n as i64, window_mm, window_mm, null_point)
}

/// Format a header row with every field at its fixed position.
pub fn header_row(header: &Header) -> String {
    let mut fields = vec![String::new(); layout::FIELD_COUNT];
    fields[0] = "BeamProfile".to_string();
    fields[1] = "1.0".to_string();
    fields[layout::PIXELS_X - 1] = "Pixels X".to_string();
    fields[layout::PIXELS_X] = header.pixels_x.to_string();
    fields[layout::PIXELS_Y - 1] = "Pixels Y".to_string();
    fields[layout::PIXELS_Y] = header.pixels_y.to_string();
    fields[layout::WINDOW_Y - 1] = "Window Y [mm]".to_string();
    fields[layout::WINDOW_Y] = header.window_y_mm.to_string();
    fields[layout::WINDOW_X - 1] = "Window X [mm]".to_string();
    fields[layout::WINDOW_X] = header.window_x_mm.to_string();
    fields[layout::NULL_POINT - 1] = "Null point".to_string();
    fields[layout::NULL_POINT] = header.null_point.to_string();
    fields.join("\t")
}

/// Render a header and grid in the tab-separated profile format.
///
/// NaN cells are written as empty fields.
pub fn profile_text(header: &Header, grid: &Grid) -> String {
    let mut out = header_row(header);
    out.push('\n');
    for row in 0..grid.rows() {
        for (i, v) in grid.row(row).iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            if !v.is_nan() {
                let _ = write!(out, "{}", v);
            }
        }
        out.push('\n');
    }
    out
}

/// Write a profile file into `dir` and return its path.
pub fn write_profile(dir: &Path, file_name: &str, header: &Header, grid: &Grid) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, profile_text(header, grid)).expect("write profile fixture");
    path
}

/// Write a profile file into a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the file is needed.
pub fn temp_profile(file_name: &str, header: &Header, grid: &Grid) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_profile(dir.path(), file_name, header, grid);
    (dir, path)
}
