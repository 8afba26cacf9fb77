//! Configuration for a beam analysis run.

use beam_common::{BeamError, BeamResult};
use serde::{Deserialize, Serialize};

/// User inputs of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper clip level (fraction of maximum power density).
    pub eta: f64,

    /// Lower clip level (fraction of maximum power density).
    pub epsilon: f64,

    /// Number of normal components used by the plateau fit (1, 2, or 3).
    pub mix_count: usize,

    /// Mixture fit tuning.
    pub fit: MixtureFitConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            eta: 0.8,
            epsilon: 0.1,
            mix_count: 1,
            fit: MixtureFitConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with default fit settings.
    pub fn new(eta: f64, epsilon: f64, mix_count: usize) -> Self {
        Self {
            eta,
            epsilon,
            mix_count,
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("BEAM_ETA") {
            if let Ok(eta) = val.parse() {
                config.eta = eta;
            }
        }

        if let Ok(val) = std::env::var("BEAM_EPSILON") {
            if let Ok(epsilon) = val.parse() {
                config.epsilon = epsilon;
            }
        }

        if let Ok(val) = std::env::var("BEAM_MIX") {
            if let Ok(mix) = val.parse() {
                config.mix_count = mix;
            }
        }

        if let Ok(val) = std::env::var("BEAM_FIT_MAX_ITER") {
            if let Ok(iters) = val.parse() {
                config.fit.max_iterations = iters;
            }
        }

        if let Ok(val) = std::env::var("BEAM_FIT_TOLERANCE") {
            if let Ok(tol) = val.parse() {
                config.fit.tolerance = tol;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BeamResult<()> {
        validate_clip_level("eta", self.eta)?;
        validate_clip_level("epsilon", self.epsilon)?;

        if self.epsilon > self.eta {
            return Err(BeamError::config(format!(
                "epsilon ({}) must not exceed eta ({})",
                self.epsilon, self.eta
            )));
        }

        validate_mix_count(self.mix_count)?;
        self.fit.validate()
    }
}

/// Tuning of the Gaussian mixture fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixtureFitConfig {
    /// Upper bound on EM iterations.
    pub max_iterations: usize,

    /// Convergence threshold on the change of the mean log-likelihood.
    pub tolerance: f64,

    /// Non-negative regularization added to every variance.
    pub reg_covar: f64,

    /// Number of points of the evaluated density curve.
    pub curve_points: usize,

    /// Fraction of the intensity range below which samples are discarded.
    pub plateau_fraction: f64,
}

impl Default for MixtureFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-3,
            reg_covar: 1e-6,
            curve_points: 10_000,
            plateau_fraction: 0.5,
        }
    }
}

impl MixtureFitConfig {
    /// Validate the fit settings.
    pub fn validate(&self) -> BeamResult<()> {
        if self.max_iterations == 0 {
            return Err(BeamError::config("fit max_iterations must be > 0"));
        }

        if !(self.tolerance > 0.0) {
            return Err(BeamError::config("fit tolerance must be > 0"));
        }

        if !(self.reg_covar >= 0.0) {
            return Err(BeamError::config("fit reg_covar must be >= 0"));
        }

        if self.curve_points < 2 {
            return Err(BeamError::config("fit curve_points must be >= 2"));
        }

        if !(0.0..1.0).contains(&self.plateau_fraction) {
            return Err(BeamError::config("fit plateau_fraction must be in [0, 1)"));
        }

        Ok(())
    }
}

/// Check that a clip level lies in [0, 1].
pub fn validate_clip_level(name: &str, clip: f64) -> BeamResult<()> {
    if !(0.0..=1.0).contains(&clip) {
        return Err(BeamError::config(format!(
            "{} must be in [0, 1], got {}",
            name, clip
        )));
    }
    Ok(())
}

/// Check that the mixture component count is 1, 2, or 3.
pub fn validate_mix_count(mix_count: usize) -> BeamResult<()> {
    if !(1..=3).contains(&mix_count) {
        return Err(BeamError::config(format!(
            "mixture count must be 1, 2, or 3, got {}",
            mix_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.eta, 0.8);
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.mix_count, 1);
        assert_eq!(config.fit.max_iterations, 1000);
        assert_eq!(config.fit.curve_points, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalysisConfig::default();

        config.eta = 1.5;
        assert!(config.validate().is_err());

        config = AnalysisConfig::default();
        config.epsilon = -0.1;
        assert!(config.validate().is_err());

        config = AnalysisConfig::new(0.2, 0.5, 1);
        assert!(matches!(config.validate(), Err(BeamError::Config(_))));

        config = AnalysisConfig::new(0.8, 0.1, 4);
        assert!(config.validate().is_err());

        config = AnalysisConfig::new(0.8, 0.1, 0);
        assert!(config.validate().is_err());

        config = AnalysisConfig::default();
        config.fit.curve_points = 1;
        assert!(config.validate().is_err());

        config = AnalysisConfig::default();
        config.fit.tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_clip_levels_are_valid() {
        assert!(AnalysisConfig::new(0.5, 0.5, 2).validate().is_ok());
        assert!(AnalysisConfig::new(1.0, 0.0, 3).validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"eta": 0.5}"#).unwrap();
        assert_eq!(config.eta, 0.5);
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.fit, MixtureFitConfig::default());
    }
}
