// Configuration for the recovery analytics engine
//
// The stall threshold, smoothing filter and plateau window are heuristics with
// no closed-form justification, so every one of them is a named field here
// instead of a literal buried in the estimators.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Significance levels for which ADF critical values are tabulated
const SUPPORTED_ADF_LEVELS: [f64; 3] = [0.01, 0.05, 0.10];

/// Tunable policy constants for RTO and steady-state analysis
///
/// # Example
/// ```
/// use recuperar::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.stall_floor_ms, 2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Percentile of pre-fault latency that defines "normal" (0.95 = p95)
    pub baseline_percentile: f64,

    /// A per-thread gap longer than this many baseline latencies is a stall
    ///
    /// Default: 5.0
    pub stall_latency_multiplier: f64,

    /// Lower bound on the stall threshold, in milliseconds
    ///
    /// Keeps scheduling jitter on very fast workloads from counting as an
    /// interruption. Default: 2000
    pub stall_floor_ms: u64,

    /// Savitzky-Golay window length (samples)
    pub smoothing_window: usize,

    /// Savitzky-Golay polynomial order, must be below `smoothing_window`
    pub smoothing_order: usize,

    /// Half-width of the window a local MSE minimum must dominate
    pub plateau_half_window: usize,

    /// Batch size for MSER block averaging
    pub mser_batch_size: usize,

    /// Length of the post-recovery window used for `recovery_factor` (seconds)
    pub recovery_window_secs: usize,

    /// Significance level for the Augmented Dickey-Fuller test
    ///
    /// One of 0.01, 0.05, 0.10.
    pub adf_significance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline_percentile: 0.95,
            stall_latency_multiplier: 5.0,
            stall_floor_ms: 2000,
            smoothing_window: 10,
            smoothing_order: 2,
            plateau_half_window: 10,
            mser_batch_size: 1,
            recovery_window_secs: 60,
            adf_significance: 0.05,
        }
    }
}

impl AnalysisConfig {
    /// Stricter stall detection and a wider plateau requirement
    pub fn strict() -> Self {
        Self {
            stall_latency_multiplier: 3.0,
            stall_floor_ms: 1000,
            plateau_half_window: 20,
            adf_significance: 0.01,
            ..Self::default()
        }
    }

    /// Looser stall detection, accepts the first shallow plateau
    pub fn permissive() -> Self {
        Self {
            stall_latency_multiplier: 10.0,
            stall_floor_ms: 5000,
            plateau_half_window: 5,
            adf_significance: 0.10,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file; missing keys take defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Stall threshold in milliseconds for a given baseline latency
    pub fn stall_threshold_ms(&self, baseline_latency_ms: Option<f64>) -> f64 {
        let floor = self.stall_floor_ms as f64;
        match baseline_latency_ms {
            Some(latency) => (self.stall_latency_multiplier * latency).max(floor),
            None => floor,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.baseline_percentile > 0.0 && self.baseline_percentile <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "baseline_percentile must be in (0, 1], got {}",
                self.baseline_percentile
            )));
        }

        if self.stall_latency_multiplier < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "stall_latency_multiplier must be non-negative, got {}",
                self.stall_latency_multiplier
            )));
        }

        if self.smoothing_window == 0 || self.smoothing_order >= self.smoothing_window {
            return Err(AnalysisError::InvalidConfig(format!(
                "smoothing_order ({}) must be below a non-zero smoothing_window ({})",
                self.smoothing_order, self.smoothing_window
            )));
        }

        if self.mser_batch_size == 0 {
            return Err(AnalysisError::InvalidConfig(
                "mser_batch_size must be >= 1".to_string(),
            ));
        }

        if self.recovery_window_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "recovery_window_secs must be >= 1".to_string(),
            ));
        }

        if !SUPPORTED_ADF_LEVELS
            .iter()
            .any(|level| (level - self.adf_significance).abs() < 1e-9)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "adf_significance must be one of 0.01, 0.05, 0.10, got {}",
                self.adf_significance
            )));
        }

        Ok(())
    }
}
