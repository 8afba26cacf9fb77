//! File-level tests for the profile reader.

use beam_common::{Grid, Header};
use profile_parser::{parse_profile_str, read_profile, ParseError};
use test_utils::{create_gaussian_beam, profile_text, temp_profile, SMALL_PROFILE};

#[test]
fn test_small_profile() {
    let profile = parse_profile_str(SMALL_PROFILE).unwrap();
    assert_eq!(profile.header, Header::new(3, 4, 2.0, 3.0, 10.0));
    assert_eq!(profile.grid.rows(), 3);
    assert_eq!(profile.grid.cols(), 4);
    assert_eq!(profile.grid.get(1, 2), Some(40.0));
    assert_eq!(profile.grid.get(1, 3), Some(11.0));
}

#[test]
fn test_round_trip_through_file() {
    let grid = create_gaussian_beam(16, 1000.0, 3.0);
    let header = Header::new(16, 16, 4.0, 4.0, 0.0);
    let (_dir, path) = temp_profile("gaussian.txt", &header, &grid);

    let profile = read_profile(&path).unwrap();
    assert_eq!(profile.header, header);
    assert_eq!(profile.grid, grid);
}

#[test]
fn test_missing_samples_are_nan() {
    let grid = Grid::from_rows(vec![vec![1.0, f64::NAN], vec![3.0, 4.0]]).unwrap();
    let text = profile_text(&Header::new(2, 2, 1.0, 1.0, 0.0), &grid);
    let profile = parse_profile_str(&text).unwrap();
    assert!(profile.grid.get(0, 1).unwrap().is_nan());
    assert_eq!(profile.grid.get(1, 1), Some(4.0));
}

#[test]
fn test_crlf_line_endings() {
    let text = SMALL_PROFILE.replace('\n', "\r\n");
    let profile = parse_profile_str(&text).unwrap();
    assert_eq!(profile.grid.get(2, 1), Some(12.0));
}

#[test]
fn test_row_count_mismatch() {
    let grid = Grid::filled(3, 2, 1.0);
    let text = profile_text(&Header::new(4, 2, 1.0, 1.0, 0.0), &grid);
    let err = parse_profile_str(&text).unwrap_err();
    assert!(matches!(
        err,
        ParseError::ShapeMismatch {
            expected_rows: 4,
            rows: 3,
            ..
        }
    ));
}

#[test]
fn test_column_count_mismatch() {
    let grid = Grid::filled(2, 3, 1.0);
    let text = profile_text(&Header::new(2, 2, 1.0, 1.0, 0.0), &grid);
    assert!(matches!(
        parse_profile_str(&text),
        Err(ParseError::ShapeMismatch {
            expected_cols: 2,
            rows: 2,
            cols: 3,
            ..
        })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_profile(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}
