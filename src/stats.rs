//! Descriptive statistics over latency and throughput samples
//!
//! Thin wrappers around trueno (SIMD mean/stddev/min) and aprender
//! (R-7 quantiles), mapping empty input to `DegenerateInput`.
//!
//! Both libraries work in `f32`. Samples are shifted by their `f64` mean
//! before narrowing so only the residuals lose precision, and every result
//! is shifted back afterwards.

use crate::error::{AnalysisError, Result};
use aprender::stats::DescriptiveStats;
use trueno::Vector;

/// Summary of a sample, all values in the sample's unit
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

fn degenerate<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::degenerate(e.to_string())
}

/// Samples re-expressed as `f32` residuals around their `f64` mean
struct Centered {
    shift: f64,
    residuals: Vector<f32>,
}

fn center(values: &[f64], what: &str) -> Result<Centered> {
    if values.is_empty() {
        return Err(AnalysisError::degenerate(format!("{} has no samples", what)));
    }
    let shift = values.iter().sum::<f64>() / values.len() as f64;
    if !shift.is_finite() {
        return Err(AnalysisError::degenerate(format!("{} is not finite", what)));
    }
    let data: Vec<f32> = values.iter().map(|&v| (v - shift) as f32).collect();
    Ok(Centered {
        shift,
        residuals: Vector::from_slice(&data),
    })
}

/// Quantile `q` in `[0, 1]` using linear interpolation between order
/// statistics (R-7, the numpy/DuckDB `quantile_cont` default)
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    let centered = center(values, "quantile input")?;
    let stats = DescriptiveStats::new(&centered.residuals);
    stats
        .quantile(q)
        .map(|r| centered.shift + f64::from(r))
        .map_err(|e| AnalysisError::degenerate(format!("quantile({}) failed: {}", q, e)))
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    let centered = center(values, "mean input")?;
    centered
        .residuals
        .mean()
        .map(|r| centered.shift + f64::from(r))
        .map_err(|e| AnalysisError::degenerate(format!("mean failed: {}", e)))
}

/// Smallest value
pub fn min(values: &[f64]) -> Result<f64> {
    let centered = center(values, "min input")?;
    centered
        .residuals
        .min()
        .map(|r| centered.shift + f64::from(r))
        .map_err(|e| AnalysisError::degenerate(format!("min failed: {}", e)))
}

/// Mean, population standard deviation, min and max
pub fn summarize(values: &[f64]) -> Result<SampleSummary> {
    let Centered { shift, residuals } = center(values, "summary input")?;

    Ok(SampleSummary {
        count: values.len(),
        mean: shift + f64::from(residuals.mean().map_err(degenerate)?),
        stddev: f64::from(residuals.stddev().map_err(degenerate)?),
        min: shift + f64::from(residuals.min().map_err(degenerate)?),
        max: shift + f64::from(residuals.max().map_err(degenerate)?),
    })
}

/// Mean after dropping one minimum and one maximum sample.
///
/// With fewer than three samples nothing is dropped.
pub fn trimmed_mean(values: &[f64]) -> Result<f64> {
    if values.len() < 3 {
        return mean(values);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    mean(&sorted[1..sorted.len() - 1])
}
