//! Gaussian mixture fit of the upper-intensity tail of a power-density
//! histogram.
//!
//! The fit isolates the high-intensity plateau: samples below
//! `min + (max - min) * plateau_fraction` are discarded, a 1-, 2- or
//! 3-component univariate normal mixture is fitted by expectation
//! maximization, and the fitted density is evaluated on a dense, evenly
//! spaced curve spanning the retained samples.
//!
//! Initialization is deterministic (k-means seeded at quantiles), so two
//! fits of the same samples are bit-identical.

use beam_common::{BeamError, BeamResult, Grid};
use statrs::distribution::{Continuous, Normal};
use tracing::{debug, warn};

use crate::config::{validate_mix_count, MixtureFitConfig};

/// Maximum number of Lloyd iterations used to seed the mixture.
const KMEANS_MAX_ITER: usize = 100;

/// One weighted normal component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureComponent {
    pub weight: f64,
    pub mean: f64,
    pub variance: f64,
}

impl MixtureComponent {
    /// Standard deviation of the component.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    fn normal(&self) -> BeamResult<Normal> {
        Normal::new(self.mean, self.std_dev()).map_err(|e| {
            BeamError::degenerate(format!(
                "invalid mixture component (mean {}, variance {}): {}",
                self.mean, self.variance, e
            ))
        })
    }
}

/// A fitted univariate Gaussian mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    /// Components in seeding order (ascending initial mean).
    pub components: Vec<MixtureComponent>,
    /// EM iterations performed.
    pub iterations: usize,
    /// Final mean log-likelihood per sample.
    pub lower_bound: f64,
}

impl GaussianMixture {
    /// Fit `mix_count` components to `samples` by expectation maximization.
    ///
    /// Fails when there are fewer distinct samples than components or when
    /// the log-likelihood has not settled within `max_iterations`.
    pub fn fit(samples: &[f64], mix_count: usize, config: &MixtureFitConfig) -> BeamResult<Self> {
        validate_mix_count(mix_count)?;
        config.validate()?;

        let distinct = count_distinct(samples);
        if distinct < mix_count {
            return Err(BeamError::degenerate(format!(
                "cannot fit {} components to {} distinct values",
                mix_count, distinct
            )));
        }

        let labels = kmeans_labels(samples, mix_count);
        let mut resp: Vec<Vec<f64>> = labels
            .iter()
            .map(|&label| {
                let mut r = vec![0.0; mix_count];
                r[label] = 1.0;
                r
            })
            .collect();

        let mut components = m_step(samples, &resp, config.reg_covar);
        let mut lower_bound = f64::NEG_INFINITY;

        for iteration in 1..=config.max_iterations {
            let previous = lower_bound;
            lower_bound = e_step(samples, &components, &mut resp)?;
            components = m_step(samples, &resp, config.reg_covar);

            if !lower_bound.is_finite() {
                return Err(BeamError::degenerate(format!(
                    "mixture log-likelihood diverged at iteration {}",
                    iteration
                )));
            }

            if (lower_bound - previous).abs() < config.tolerance {
                debug!(
                    iterations = iteration,
                    lower_bound,
                    components = mix_count,
                    "Mixture fit converged"
                );
                return Ok(Self {
                    components,
                    iterations: iteration,
                    lower_bound,
                });
            }
        }

        warn!(
            max_iterations = config.max_iterations,
            lower_bound, "Mixture fit did not converge"
        );
        Err(BeamError::degenerate(format!(
            "mixture fit did not converge within {} iterations",
            config.max_iterations
        )))
    }

    /// Weighted sum of the component densities at `x`.
    pub fn density_curve(&self, x: Vec<f64>) -> BeamResult<DensityCurve> {
        let normals = self
            .components
            .iter()
            .map(|c| c.normal().map(|n| (c.weight, n)))
            .collect::<BeamResult<Vec<_>>>()?;

        let y = x
            .iter()
            .map(|&xi| normals.iter().map(|(w, n)| n.pdf(xi) * w).sum())
            .collect();

        Ok(DensityCurve { x, y })
    }
}

/// A densely sampled continuous curve `(x, y)` with uniform x spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl DensityCurve {
    /// Spacing between consecutive x samples.
    pub fn step(&self) -> f64 {
        match (self.x.first(), self.x.get(1)) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Index of the first maximum of `y`.
    pub fn peak_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.y.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// x position of the curve's maximum.
    pub fn peak_position(&self) -> Option<f64> {
        self.peak_index().map(|i| self.x[i])
    }

    /// Full width at half maximum: the number of samples at or above half
    /// the peak value times the x step.
    pub fn full_width_half_maximum(&self) -> f64 {
        let Some(peak) = self.peak_index().map(|i| self.y[i]) else {
            return 0.0;
        };
        let half_max = peak / 2.0;
        let count = self.y.iter().filter(|&&v| v >= half_max).count();
        count as f64 * self.step()
    }
}

/// Fit a mixture to the upper half of the intensity range of `values` and
/// return the evaluated density curve.
pub fn fit(values: &[f64], mix_count: usize, config: &MixtureFitConfig) -> BeamResult<DensityCurve> {
    validate_mix_count(mix_count)?;

    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let (min, max) = min_max(&valid)
        .ok_or_else(|| BeamError::degenerate("no valid samples to fit"))?;

    let cut_off = (max - min) * config.plateau_fraction + min;
    let plateau: Vec<f64> = valid.into_iter().filter(|&v| v >= cut_off).collect();
    debug!(
        samples = plateau.len(),
        cut_off, "Selected plateau samples for mixture fit"
    );

    let mixture = GaussianMixture::fit(&plateau, mix_count, config)?;

    let (lo, hi) = min_max(&plateau)
        .ok_or_else(|| BeamError::degenerate("no samples above the plateau cut-off"))?;
    mixture.density_curve(linspace(lo, hi, config.curve_points))
}

/// [`fit`] over every cell of a grid.
pub fn fit_grid(grid: &Grid, mix_count: usize, config: &MixtureFitConfig) -> BeamResult<DensityCurve> {
    fit(grid.data(), mix_count, config)
}

/// `n` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut x: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            x[n - 1] = stop;
            x
        }
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

fn count_distinct(samples: &[f64]) -> usize {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Hard 1-D k-means labels, seeded at the quantile midpoints.
fn kmeans_labels(samples: &[f64], k: usize) -> Vec<usize> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mut centers: Vec<f64> = (0..k).map(|j| sorted[((2 * j + 1) * n) / (2 * k)]).collect();

    let mut labels = vec![0usize; n];
    for _ in 0..KMEANS_MAX_ITER {
        let mut changed = false;
        for (label, &x) in labels.iter_mut().zip(samples) {
            let nearest = nearest_center(&centers, x);
            if nearest != *label {
                *label = nearest;
                changed = true;
            }
        }

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&label, &x) in labels.iter().zip(samples) {
            sums[label] += x;
            counts[label] += 1;
        }
        for j in 0..k {
            if counts[j] > 0 {
                centers[j] = sums[j] / counts[j] as f64;
            }
        }

        if !changed {
            break;
        }
    }
    labels
}

fn nearest_center(centers: &[f64], x: f64) -> usize {
    let mut best = 0;
    for (j, &c) in centers.iter().enumerate().skip(1) {
        if (x - c).abs() < (x - centers[best]).abs() {
            best = j;
        }
    }
    best
}

/// Update responsibilities in place; returns the mean log-likelihood.
fn e_step(
    samples: &[f64],
    components: &[MixtureComponent],
    resp: &mut [Vec<f64>],
) -> BeamResult<f64> {
    let normals = components
        .iter()
        .map(|c| c.normal().map(|n| (c.weight.ln(), n)))
        .collect::<BeamResult<Vec<_>>>()?;

    let mut total = 0.0;
    let mut log_prob = vec![0.0; components.len()];
    for (&x, r) in samples.iter().zip(resp.iter_mut()) {
        for (lp, (log_w, normal)) in log_prob.iter_mut().zip(&normals) {
            *lp = log_w + normal.ln_pdf(x);
        }
        let norm = log_sum_exp(&log_prob);
        for (rj, lp) in r.iter_mut().zip(&log_prob) {
            *rj = (lp - norm).exp();
        }
        total += norm;
    }
    Ok(total / samples.len() as f64)
}

fn m_step(samples: &[f64], resp: &[Vec<f64>], reg_covar: f64) -> Vec<MixtureComponent> {
    let k = resp.first().map(Vec::len).unwrap_or(0);
    let mut components = Vec::with_capacity(k);

    for j in 0..k {
        let nk: f64 = resp.iter().map(|r| r[j]).sum::<f64>() + 10.0 * f64::EPSILON;
        let mean = resp
            .iter()
            .zip(samples)
            .map(|(r, &x)| r[j] * x)
            .sum::<f64>()
            / nk;
        let variance = resp
            .iter()
            .zip(samples)
            .map(|(r, &x)| r[j] * (x - mean).powi(2))
            .sum::<f64>()
            / nk
            + reg_covar;
        components.push(MixtureComponent {
            weight: nk,
            mean,
            variance,
        });
    }

    let total: f64 = components.iter().map(|c| c.weight).sum();
    for c in components.iter_mut() {
        c.weight /= total;
    }
    components
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}
