//! The analysis pipeline: raw grid and header in, `BeamMetrics` out.

use beam_common::{Axis, BeamResult, Grid, Header};
use tracing::{debug, info, instrument};

use crate::config::AnalysisConfig;
use crate::energy::{build_energy_table, EnergyTable};
use crate::metrics::BeamMetrics;
use crate::moments::{centroid_from, width_from, MomentProfiles};
use crate::{iso, measured, mixture, niso, preprocess};

/// Output of one analysis run.
#[derive(Debug, Clone)]
pub struct BeamAnalysis {
    /// Every computed scalar.
    pub metrics: BeamMetrics,
    /// Background-corrected grid the metrics were computed from.
    pub corrected: Grid,
    /// Cumulative-energy table of the raw grid.
    pub energy_table: EnergyTable,
}

/// Run the full characterization of a raw detector grid.
///
/// The configuration is validated before anything is computed. Centroid
/// and second-moment width are taken on the transposed corrected grid;
/// clip-level widths along x use the transposed grid and along y the
/// grid as is. The energy table is built from the raw grid.
#[instrument(skip_all, fields(rows = raw.rows(), cols = raw.cols(), eta = config.eta, epsilon = config.epsilon, mix = config.mix_count))]
pub fn analyze(raw: &Grid, header: &Header, config: &AnalysisConfig) -> BeamResult<BeamAnalysis> {
    config.validate()?;
    let AnalysisConfig {
        eta,
        epsilon,
        mix_count,
        ref fit,
    } = *config;

    let corrected = preprocess::correct(raw, header)?;
    let x_resolution = preprocess::resolution(header, Axis::X)?;
    let y_resolution = preprocess::resolution(header, Axis::Y)?;
    let transposed = corrected.transposed();

    // Measured quantities
    let max_power_density = measured::max_power_density(&corrected);
    let total_power = measured::total_power(&corrected);
    let power_density_eta = measured::clip_level_power_density(&corrected, eta);
    let power_eta = measured::clip_level_power(&corrected, eta);
    debug!(max_power_density, total_power, "Measured quantities");

    // ISO
    let fractional_power_eta = iso::fractional_power(&corrected, eta)?;
    let profiles = MomentProfiles::accumulate(&transposed);
    let (center_x, center_y) = centroid_from(&profiles)?;
    let (width_x, width_y) = width_from(&profiles, (center_x, center_y))?;
    let aspect_ratio = iso::aspect_ratio(width_x, x_resolution, width_y, y_resolution)?;
    let irradiation_area_eta = iso::irradiation_area(&corrected, eta);
    let irradiation_area_epsilon = iso::irradiation_area(&corrected, epsilon);
    let average_power_density_eta = iso::average_power_density(power_eta, irradiation_area_eta)?;
    let flatness_factor_eta = iso::flatness_factor(average_power_density_eta, max_power_density)?;
    let beam_uniformity_eta = iso::beam_uniformity(
        &corrected,
        average_power_density_eta,
        irradiation_area_eta,
        power_density_eta,
    )?;
    let plateau_curve = mixture::fit_grid(&corrected, mix_count, fit)?;
    let plateau_uniformity_eta = iso::plateau_uniformity_from(&plateau_curve, max_power_density)?;
    let edge_steepness_eta = iso::edge_steepness(irradiation_area_epsilon, irradiation_area_eta)?;
    debug!(center_x, center_y, width_x, width_y, "ISO parameters");

    // Non-ISO
    let width_x_eta = niso::clip_level_width(&transposed, eta);
    let width_y_eta = niso::clip_level_width(&corrected, eta);
    let edge_x_epsilon_eta = niso::clip_level_edge_width(&transposed, epsilon, eta);
    let edge_y_epsilon_eta = niso::clip_level_edge_width(&corrected, epsilon, eta);
    let mod_plateau_uniformity_eta = niso::modified_plateau_uniformity_from(&plateau_curve)?;
    let energy_table = build_energy_table(raw)?;
    let top_hat_factor = niso::top_hat_factor(&energy_table)?;

    let metrics = BeamMetrics {
        eta,
        epsilon,
        mix_count,
        x_resolution,
        y_resolution,
        max_power_density,
        total_power,
        power_density_eta,
        power_eta,
        fractional_power_eta,
        center_x,
        center_y,
        width_x,
        width_y,
        aspect_ratio,
        irradiation_area_eta,
        irradiation_area_epsilon,
        average_power_density_eta,
        flatness_factor_eta,
        beam_uniformity_eta,
        plateau_uniformity_eta,
        edge_steepness_eta,
        width_x_eta,
        width_y_eta,
        edge_x_epsilon_eta,
        edge_y_epsilon_eta,
        mod_plateau_uniformity_eta,
        top_hat_factor,
    };

    info!(
        total_power,
        width_x,
        width_y,
        top_hat_factor,
        "Beam analysis complete"
    );

    Ok(BeamAnalysis {
        metrics,
        corrected,
        energy_table,
    })
}
