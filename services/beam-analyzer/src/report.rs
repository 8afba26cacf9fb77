//! JSON report of an analysis run.
//!
//! The report mirrors the layout engineers know from the lab sheets: an
//! "ISO" part and a "Non-ISO" part, each split into titled sections of
//! `{item, value, unit, remark}` entries. Pixel quantities are converted
//! to millimeters with the axis resolution.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beam_engine::{BeamAnalysis, BeamMetrics};
use serde::Serialize;
use tracing::info;

const CLIP_INDEPENDENT: &str = "Independent of the clip-level";

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub item: String,
    pub value: f64,
    pub unit: String,
    pub remark: String,
}

/// A titled group of entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub entries: Vec<ReportEntry>,
}

/// Complete report for one profile.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: String,
    pub iso: Vec<ReportSection>,
    pub non_iso: Vec<ReportSection>,
    pub metrics: BeamMetrics,
}

fn entry(item: &str, value: f64, unit: &str, remark: impl Into<String>) -> ReportEntry {
    ReportEntry {
        item: item.to_string(),
        value,
        unit: unit.to_string(),
        remark: remark.into(),
    }
}

fn section(title: &str, entries: Vec<ReportEntry>) -> ReportSection {
    ReportSection {
        title: title.to_string(),
        entries,
    }
}

fn clip(level: f64) -> String {
    format!("Clip-level: {:.1}%", level * 100.0)
}

fn clip_pair(low: f64, high: f64) -> String {
    format!("Clip-level: {:.1}% and {:.1}%", low * 100.0, high * 100.0)
}

impl Report {
    /// Build the report of one analysis.
    pub fn new(source: &str, m: &BeamMetrics) -> Self {
        let (eta, epsilon) = (m.eta, m.epsilon);
        let (center_x_mm, center_y_mm) = m.center_mm();
        let (width_x_mm, width_y_mm) = m.width_mm();

        let iso = vec![
            section(
                "Beam power",
                vec![
                    entry("Total power", m.total_power, "ADC", CLIP_INDEPENDENT),
                    entry("Clip-level power", m.power_eta, "ADC", clip(eta)),
                ],
            ),
            section(
                "Beam power density",
                vec![
                    entry("Maximum power density", m.max_power_density, "ADC", CLIP_INDEPENDENT),
                    entry("Clip-level power density", m.power_density_eta, "ADC", clip(eta)),
                    entry(
                        "Clip-level average power density",
                        m.average_power_density_eta,
                        "ADC",
                        clip(eta),
                    ),
                ],
            ),
            section(
                "Beam position",
                vec![
                    entry("Beam centroid x-axis", center_x_mm, "mm", CLIP_INDEPENDENT),
                    entry("Beam centroid y-axis", center_y_mm, "mm", CLIP_INDEPENDENT),
                ],
            ),
            section(
                "Effective beam size",
                vec![
                    entry("Beam width x-axis", width_x_mm, "mm", CLIP_INDEPENDENT),
                    entry("Beam width y-axis", width_y_mm, "mm", CLIP_INDEPENDENT),
                    entry(
                        "Clip-level irradiation area",
                        m.irradiation_area_epsilon as f64,
                        "pixel",
                        clip(epsilon),
                    ),
                    entry(
                        "Clip-level irradiation area",
                        m.irradiation_area_eta as f64,
                        "pixel",
                        clip(eta),
                    ),
                ],
            ),
            section(
                "Beam shape",
                vec![
                    entry(
                        "Beam aspect ratio",
                        m.aspect_ratio,
                        "N/A",
                        format!("{}. Equals 1 for a perfect square", CLIP_INDEPENDENT),
                    ),
                    entry("Fractional power", m.fractional_power_eta, "N/A", clip(eta)),
                    entry(
                        "Flatness factor",
                        m.flatness_factor_eta,
                        "N/A",
                        format!("{}. Equals 1 for a perfect flat top", clip(eta)),
                    ),
                    entry(
                        "Beam uniformity",
                        m.beam_uniformity_eta,
                        "N/A",
                        format!(
                            "{}. Equals 0 for a perfect flat top with vertical edges",
                            clip(eta)
                        ),
                    ),
                    entry(
                        "Plateau uniformity",
                        m.plateau_uniformity_eta,
                        "N/A",
                        format!("{}. Equals 0 for a perfect flat top", clip(eta)),
                    ),
                    entry(
                        "Edge steepness",
                        m.edge_steepness_eta,
                        "N/A",
                        format!("{}. Equals 0 for a perfect vertical edge", clip(eta)),
                    ),
                ],
            ),
        ];

        let non_iso = vec![
            section(
                "Effective beam size",
                vec![
                    entry(
                        "Clip-level beam width x-axis",
                        m.width_x_eta * m.x_resolution,
                        "mm",
                        clip(eta),
                    ),
                    entry(
                        "Clip-level beam width y-axis",
                        m.width_y_eta * m.y_resolution,
                        "mm",
                        clip(eta),
                    ),
                    entry(
                        "Clip-level edge width x-axis",
                        m.edge_x_epsilon_eta * m.x_resolution,
                        "mm",
                        clip_pair(epsilon, eta),
                    ),
                    entry(
                        "Clip-level edge width y-axis",
                        m.edge_y_epsilon_eta * m.y_resolution,
                        "mm",
                        clip_pair(epsilon, eta),
                    ),
                ],
            ),
            section(
                "Beam shape",
                vec![
                    entry(
                        "Plateau uniformity",
                        m.mod_plateau_uniformity_eta,
                        "N/A",
                        format!("{}. Equals 0 for a perfect flat top", clip(eta)),
                    ),
                    entry(
                        "Top-hat factor",
                        m.top_hat_factor,
                        "N/A",
                        format!("{}. Equals 1 for a perfect square", CLIP_INDEPENDENT),
                    ),
                ],
            ),
        ];

        Self {
            source: source.to_string(),
            iso,
            non_iso,
            metrics: m.clone(),
        }
    }
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string())
}

/// `Beam Analysis - <stem>.json` next to the input file.
pub fn report_path(input: &Path) -> PathBuf {
    input.with_file_name(format!("Beam Analysis - {}.json", file_stem(input)))
}

/// `<stem>.energy.json` next to the input file.
pub fn energy_table_path(input: &Path) -> PathBuf {
    input.with_file_name(format!("{}.energy.json", file_stem(input)))
}

/// Write the report and the energy table of an analysis next to its input.
pub fn write(input: &Path, analysis: &BeamAnalysis) -> Result<(PathBuf, PathBuf)> {
    let source = input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report = Report::new(&source, &analysis.metrics);

    let report_file = report_path(input);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    fs::write(&report_file, json)
        .with_context(|| format!("Failed to write report: {}", report_file.display()))?;

    let energy_file = energy_table_path(input);
    let json = serde_json::to_string_pretty(&analysis.energy_table)
        .context("Failed to serialize energy table")?;
    fs::write(&energy_file, json)
        .with_context(|| format!("Failed to write energy table: {}", energy_file.display()))?;

    info!(
        report = %report_file.display(),
        energy_table = %energy_file.display(),
        "Wrote analysis report"
    );
    Ok((report_file, energy_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam_engine::{analyze, AnalysisConfig};
    use test_utils::{create_flat_top_beam, square_header};

    fn flat_top_metrics() -> BeamAnalysis {
        let grid = create_flat_top_beam(20, 8, 500.0);
        analyze(&grid, &square_header(20, 10.0, 0.0), &AnalysisConfig::default()).unwrap()
    }

    fn find<'a>(sections: &'a [ReportSection], item: &str) -> &'a ReportEntry {
        sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .find(|e| e.item == item)
            .unwrap()
    }

    #[test]
    fn test_output_paths() {
        let input = Path::new("/data/run 7/beam.txt");
        assert_eq!(
            report_path(input),
            PathBuf::from("/data/run 7/Beam Analysis - beam.json")
        );
        assert_eq!(
            energy_table_path(input),
            PathBuf::from("/data/run 7/beam.energy.json")
        );
    }

    #[test]
    fn test_clip_remarks() {
        assert_eq!(clip(0.8), "Clip-level: 80.0%");
        assert_eq!(clip_pair(0.1, 0.8), "Clip-level: 10.0% and 80.0%");
    }

    #[test]
    fn test_report_converts_to_millimeters() {
        let analysis = flat_top_metrics();
        let report = Report::new("flat.txt", &analysis.metrics);

        assert_eq!(report.iso.len(), 5);
        assert_eq!(report.non_iso.len(), 2);

        // 0.5 mm per pixel
        assert_eq!(find(&report.iso, "Beam centroid x-axis").value, 5.0);
        assert_eq!(find(&report.non_iso, "Clip-level beam width y-axis").value, 4.0);
        assert_eq!(find(&report.iso, "Flatness factor").value, 1.0);
        assert_eq!(find(&report.iso, "Total power").remark, CLIP_INDEPENDENT);
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("flat.txt");
        let (report_file, energy_file) = write(&input, &flat_top_metrics()).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_file).unwrap()).unwrap();
        assert_eq!(report["source"], "flat.txt");
        assert_eq!(report["metrics"]["center_x"], 10);

        let table: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(energy_file).unwrap()).unwrap();
        assert_eq!(table["lower_limit"], 0);
        assert_eq!(table["bins"].as_array().unwrap().len(), 501);
    }
}
