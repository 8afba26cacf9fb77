//! Configuration resolution for the analyzer.
//!
//! Precedence, highest first: command-line flags, YAML config file,
//! environment variables, built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use beam_engine::AnalysisConfig;
use serde::Deserialize;
use tracing::debug;

/// Shape of the YAML config file. Every field is optional; absent fields
/// keep the value from the environment or the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub eta: Option<f64>,
    pub epsilon: Option<f64>,
    pub mix_count: Option<usize>,
    #[serde(default)]
    pub fit: FitOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitOverrides {
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub reg_covar: Option<f64>,
    pub curve_points: Option<usize>,
    pub plateau_fraction: Option<f64>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlagOverrides {
    pub eta: Option<f64>,
    pub epsilon: Option<f64>,
    pub mix_count: Option<usize>,
}

impl ConfigFile {
    /// Load a config file from YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(file)
    }

    fn apply(&self, config: &mut AnalysisConfig) {
        override_with(&mut config.eta, self.eta);
        override_with(&mut config.epsilon, self.epsilon);
        override_with(&mut config.mix_count, self.mix_count);

        let fit = &mut config.fit;
        override_with(&mut fit.max_iterations, self.fit.max_iterations);
        override_with(&mut fit.tolerance, self.fit.tolerance);
        override_with(&mut fit.reg_covar, self.fit.reg_covar);
        override_with(&mut fit.curve_points, self.fit.curve_points);
        override_with(&mut fit.plateau_fraction, self.fit.plateau_fraction);
    }
}

impl FlagOverrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        override_with(&mut config.eta, self.eta);
        override_with(&mut config.epsilon, self.epsilon);
        override_with(&mut config.mix_count, self.mix_count);
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Merge the environment, an optional config file and the command-line
/// flags into one validated configuration.
pub fn resolve(file: Option<&Path>, flags: FlagOverrides) -> Result<AnalysisConfig> {
    let file = file.map(ConfigFile::load).transpose()?;
    merge(AnalysisConfig::from_env(), file.as_ref(), flags)
}

fn merge(
    mut config: AnalysisConfig,
    file: Option<&ConfigFile>,
    flags: FlagOverrides,
) -> Result<AnalysisConfig> {
    if let Some(file) = file {
        file.apply(&mut config);
    }
    flags.apply(&mut config);
    config.validate().context("Invalid analysis configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_overrides() {
        let config = merge(AnalysisConfig::default(), None, FlagOverrides::default()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_file_overrides_base() {
        let file: ConfigFile = serde_yaml::from_str(
            "eta: 0.6\nmix_count: 2\nfit:\n  max_iterations: 250\n",
        )
        .unwrap();
        let config = merge(AnalysisConfig::default(), Some(&file), FlagOverrides::default()).unwrap();
        assert_eq!(config.eta, 0.6);
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.mix_count, 2);
        assert_eq!(config.fit.max_iterations, 250);
        assert_eq!(config.fit.curve_points, 10_000);
    }

    #[test]
    fn test_flags_override_file() {
        let file: ConfigFile = serde_yaml::from_str("eta: 0.6\nepsilon: 0.2\n").unwrap();
        let flags = FlagOverrides {
            eta: Some(0.9),
            ..Default::default()
        };
        let config = merge(AnalysisConfig::default(), Some(&file), flags).unwrap();
        assert_eq!(config.eta, 0.9);
        assert_eq!(config.epsilon, 0.2);
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        let flags = FlagOverrides {
            eta: Some(0.05),
            ..Default::default()
        };
        assert!(merge(AnalysisConfig::default(), None, flags).is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<ConfigFile>("etta: 0.5\n").is_err());
    }

    #[test]
    fn test_resolve_reads_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "BEAM_FIT_MAX_ITER=321\n").unwrap();
        dotenvy::from_path(&path).unwrap();

        let config = resolve(None, FlagOverrides::default()).unwrap();
        assert_eq!(config.fit.max_iterations, 321);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beam.yaml");
        fs::write(&path, "epsilon: 0.05\n").unwrap();
        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.epsilon, Some(0.05));
        assert!(ConfigFile::load(&dir.path().join("missing.yaml")).is_err());
    }
}
