//! Reader for laser beam profile dumps.
//!
//! A profile file is tab-separated text. The first line is the instrument
//! header; every following line is one grid row (x-axis) of intensity
//! samples along the y-axis, in detector ADC counts.
//!
//! # Header layout
//!
//! Only five header fields are read, by 0-based position:
//!
//! | Field | Content |
//! |---|---|
//! | 5 | pixel count X |
//! | 8 | pixel count Y |
//! | 11 | window size Y (mm) |
//! | 14 | window size X (mm) |
//! | 17 | null point (mean background, ADC) |
//!
//! Empty or non-numeric sample fields are read as missing (NaN). Blank
//! lines are skipped.

pub mod error;

use std::fs;
use std::path::Path;

use beam_common::{Grid, Header};
use tracing::debug;

pub use error::{ParseError, ParseResult};

const PIXELS_X_FIELD: usize = 5;
const PIXELS_Y_FIELD: usize = 8;
const WINDOW_Y_FIELD: usize = 11;
const WINDOW_X_FIELD: usize = 14;
const NULL_POINT_FIELD: usize = 17;

/// A parsed profile: typed header plus raw (uncorrected) sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub header: Header,
    pub grid: Grid,
}

/// Read and parse a profile file.
pub fn read_profile(path: impl AsRef<Path>) -> ParseResult<Profile> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let profile = parse_profile_str(&text)?;
    debug!(
        path = %path.display(),
        rows = profile.grid.rows(),
        cols = profile.grid.cols(),
        "Read beam profile"
    );
    Ok(profile)
}

/// Parse the contents of a profile file.
pub fn parse_profile_str(text: &str) -> ParseResult<Profile> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| ParseError::MalformedHeader("file is empty".to_string()))?;
    let header = parse_header(header_line)?;

    let expected_cols = header.pixels_y as usize;
    let mut rows = Vec::with_capacity(header.pixels_x as usize);
    let mut ragged: Option<(usize, usize)> = None;
    for (index, line) in lines {
        let row = parse_row(line, expected_cols);
        if ragged.is_none() && row.len() != expected_cols {
            ragged = Some((index + 1, row.len()));
        }
        rows.push(row);
    }

    let cols = match ragged {
        Some((line, cols)) => {
            debug!(line, cols, expected_cols, "Row length differs from header");
            cols
        }
        None => expected_cols,
    };
    if ragged.is_some() || rows.len() as i64 != header.pixels_x {
        return Err(ParseError::ShapeMismatch {
            expected_rows: header.pixels_x,
            expected_cols: header.pixels_y,
            rows: rows.len(),
            cols,
        });
    }

    let grid = Grid::from_rows(rows)?;
    Ok(Profile { header, grid })
}

/// Parse the header line into a validated [`Header`].
pub fn parse_header(line: &str) -> ParseResult<Header> {
    let fields: Vec<&str> = line.split('\t').collect();

    let header = Header::new(
        parse_count(&fields, PIXELS_X_FIELD, "pixel count X")?,
        parse_count(&fields, PIXELS_Y_FIELD, "pixel count Y")?,
        parse_number(&fields, WINDOW_X_FIELD, "window size X")?,
        parse_number(&fields, WINDOW_Y_FIELD, "window size Y")?,
        parse_number(&fields, NULL_POINT_FIELD, "null point")?,
    );
    header.validate()?;
    Ok(header)
}

fn header_field<'a>(fields: &[&'a str], index: usize, name: &str) -> ParseResult<&'a str> {
    fields
        .get(index)
        .map(|f| f.trim())
        .ok_or_else(|| {
            ParseError::MalformedHeader(format!(
                "missing {} (field {}), header has {} fields",
                name,
                index,
                fields.len()
            ))
        })
}

fn parse_number(fields: &[&str], index: usize, name: &str) -> ParseResult<f64> {
    let raw = header_field(fields, index, name)?;
    raw.parse::<f64>().map_err(|_| {
        ParseError::MalformedHeader(format!("{} (field {}) is not a number: {:?}", name, index, raw))
    })
}

fn parse_count(fields: &[&str], index: usize, name: &str) -> ParseResult<i64> {
    let raw = header_field(fields, index, name)?;
    if let Ok(count) = raw.parse::<i64>() {
        return Ok(count);
    }
    // Some exports write counts as "256.0".
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(ParseError::MalformedHeader(format!(
            "{} (field {}) is not an integer: {:?}",
            name, index, raw
        ))),
    }
}

/// Samples of one data line. Empty fields past `expected_cols` are dropped.
fn parse_row(line: &str, expected_cols: usize) -> Vec<f64> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    while fields.len() > expected_cols && fields.last().is_some_and(|f| f.trim().is_empty()) {
        fields.pop();
    }
    fields.iter().map(|f| parse_sample(f)).collect()
}

fn parse_sample(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_positions() {
        let line = "a\tb\tc\td\te\t200\tf\tg\t100\th\ti\t4.0\tj\tk\t5.0\tl\tm\t12.5";
        let header = parse_header(line).unwrap();
        assert_eq!(header, Header::new(200, 100, 5.0, 4.0, 12.5));
    }

    #[test]
    fn test_parse_header_accepts_float_counts() {
        let line = "\t\t\t\t\t64.0\t\t\t32\t\t\t1\t\t\t2\t\t\t0";
        let header = parse_header(line).unwrap();
        assert_eq!((header.pixels_x, header.pixels_y), (64, 32));
    }

    #[test]
    fn test_parse_header_too_short() {
        let err = parse_header("a\tb\tc\td\te\t200").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader(_)));
    }

    #[test]
    fn test_parse_header_rejects_fractional_count() {
        let line = "\t\t\t\t\t64.5\t\t\t32\t\t\t1\t\t\t2\t\t\t0";
        assert!(matches!(
            parse_header(line),
            Err(ParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_parse_header_invalid_values() {
        let line = "\t\t\t\t\t0\t\t\t32\t\t\t1\t\t\t2\t\t\t0";
        assert!(matches!(parse_header(line), Err(ParseError::Beam(_))));
    }

    #[test]
    fn test_parse_row_samples() {
        let row = parse_row("1\t 2.5 \t\tx", 4);
        assert_eq!(row[0], 1.0);
        assert_eq!(row[1], 2.5);
        assert!(row[2].is_nan());
        assert!(row[3].is_nan());
    }

    #[test]
    fn test_parse_row_trailing_tabs() {
        assert_eq!(parse_row("1\t2\t\t", 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_short_row_is_shape_mismatch() {
        let header = "\t\t\t\t\t2\t\t\t3\t\t\t1\t\t\t1\t\t\t0";
        let text = format!("{}\n1\t2\t3\n1\t2\n", header);
        let err = parse_profile_str(&text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ShapeMismatch {
                expected_rows: 2,
                expected_cols: 3,
                rows: 2,
                cols: 2,
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_profile_str("\n\n"),
            Err(ParseError::MalformedHeader(_))
        ));
    }
}
