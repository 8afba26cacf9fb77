//! Batch analysis of every profile in a directory.
//!
//! Files are analyzed as independent runs on the rayon thread pool. A
//! failing file is logged and counted; it never stops the others.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beam_engine::AnalysisConfig;
use rayon::prelude::*;
use tracing::{error, info};

use crate::analyze_file;

/// Outcome of a batch run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Whether a directory entry looks like a profile rather than one of our
/// own outputs or a config file.
fn is_profile(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    !matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

/// Collect the profile files of a directory, sorted by name.
pub fn collect_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read batch directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_profile(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Analyze every profile in `dir` in parallel.
pub fn run(dir: &Path, config: &AnalysisConfig) -> Result<BatchSummary> {
    let files = collect_profiles(dir)?;
    info!(dir = %dir.display(), files = files.len(), "Starting batch analysis");

    let results: Vec<(PathBuf, Result<()>)> = files
        .into_par_iter()
        .map(|path| {
            let outcome = analyze_file(&path, config).map(|_| ());
            (path, outcome)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (path, outcome) in results {
        match outcome {
            Ok(()) => summary.succeeded.push(path),
            Err(e) => {
                error!(file = %path.display(), error = %format!("{:#}", e), "Analysis failed");
                summary.failed.push((path, format!("{:#}", e)));
            }
        }
    }

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Batch analysis complete"
    );
    Ok(summary)
}
