//! Beam characterization engine.
//!
//! Turns a raster power-density measurement (a detector grid plus its
//! instrument header) into the beam-quality parameters of ISO 13694 and
//! ISO 11145, together with a handful of common non-ISO parameters.
//!
//! # Pipeline
//!
//! ```text
//! raw Grid + Header
//!      │
//!      ▼
//! preprocess::correct (subtract null point)
//!      │
//!      ├─► measured: max / total / clip-level power
//!      │
//!      ├─► moments: centroid, second-moment width (transposed grid)
//!      │
//!      ├─► iso: area, flatness, uniformity, edge steepness
//!      │         │
//!      │         └─► mixture: plateau FWHM
//!      │
//!      └─► niso: clip-level widths, modified plateau uniformity
//!                │
//!                └─► energy table (raw grid) ─► top-hat factor
//!                         │
//!                         ▼
//!                    BeamMetrics
//! ```
//!
//! # Example
//!
//! ```ignore
//! use beam_engine::{analyze, AnalysisConfig};
//!
//! let analysis = analyze(&grid, &header, &AnalysisConfig::default())?;
//! println!("D4σ x = {} px", analysis.metrics.width_x);
//! ```

pub mod analysis;
pub mod config;
pub mod energy;
pub mod iso;
pub mod measured;
pub mod metrics;
pub mod mixture;
pub mod moments;
pub mod niso;
pub mod preprocess;

// Re-exports
pub use analysis::{analyze, BeamAnalysis};
pub use config::{AnalysisConfig, MixtureFitConfig};
pub use energy::{build_energy_table, EnergyBin, EnergyTable};
pub use metrics::BeamMetrics;
pub use mixture::{DensityCurve, GaussianMixture};
pub use moments::UNDEFINED_WIDTH;
