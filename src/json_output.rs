//! JSON output for analysis reports
//!
//! `--format json` prints one document per analyzed result directory. Absent
//! metrics are `null`, never `-1`.

use crate::engine::{MetricsRecord, RunReport};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RTO pass summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRto {
    pub rto_ms: f64,
    pub stddev_ms: f64,
    pub thread_count: usize,
    /// Pre-fault baseline latency (null when no transaction completed in the
    /// baseline window)
    pub baseline_latency_ms: Option<f64>,
    pub stall_threshold_ms: f64,
    /// Threads with at least one interruption
    pub interrupted_threads: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_gap_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_success_after_fault_ms: Option<u64>,
}

/// RPO pass summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpo {
    pub rpo_ms: u64,
    pub lost_transactions: usize,
    /// Merged `[start, end]` windows, epoch milliseconds
    pub lost_windows: Vec<[u64; 2]>,
}

/// Steady-state metrics for one fault interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFragment {
    pub fault_start_sec: f64,
    pub period_end_sec: f64,
    pub recovery_time_factor: f64,
    pub total_performance_factor: Option<f64>,
    pub absorption_factor: Option<f64>,
    pub recovery_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adf_statistic: Option<f64>,
    pub stationary: Option<bool>,
}

/// Complete JSON document for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRunReport {
    pub version: String,
    pub result_dir: String,
    pub metrics: MetricsRecord,
    pub onsets: Vec<f64>,
    pub desired_performance: Option<f64>,
    pub rto: Option<JsonRto>,
    pub rpo: Option<JsonRpo>,
    pub fragments: Vec<JsonFragment>,
}

impl JsonRunReport {
    pub fn from_report(result_dir: &Path, report: &RunReport) -> Self {
        let rto = report.rto.as_ref().map(|rto| JsonRto {
            rto_ms: rto.rto_ms,
            stddev_ms: rto.stddev_ms,
            thread_count: rto.thread_count,
            baseline_latency_ms: rto.baseline_latency_ms,
            stall_threshold_ms: rto.stall_threshold_ms,
            interrupted_threads: rto.per_thread.values().filter(|t| t.total_ms > 0).count(),
            longest_gap_ms: rto.diagnostics.longest_gap.map(|(from, to)| to - from),
            first_success_after_fault_ms: rto.diagnostics.first_success_after_fault_ms,
        });

        let rpo = report.rpo.as_ref().map(|rpo| JsonRpo {
            rpo_ms: rpo.rpo_ms,
            lost_transactions: rpo.lost_transactions,
            lost_windows: rpo.lost_windows.iter().map(|w| [w.start, w.end]).collect(),
        });

        let (desired_performance, fragments) = match &report.steady_state {
            Some(steady) => (
                steady.desired_performance,
                steady
                    .fragments
                    .iter()
                    .map(|f| JsonFragment {
                        fault_start_sec: f.interval.start_secs,
                        period_end_sec: f.interval.end_secs,
                        recovery_time_factor: f.factors.recovery_time_factor,
                        total_performance_factor: f.factors.total_performance_factor,
                        absorption_factor: f.factors.absorption_factor,
                        recovery_factor: f.factors.recovery_factor,
                        adf_statistic: f.adf.as_ref().map(|a| a.statistic),
                        stationary: f.adf.as_ref().map(|a| a.stationary),
                    })
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            result_dir: result_dir.display().to_string(),
            metrics: report.metrics,
            onsets: report.onsets.clone(),
            desired_performance,
            rto,
            rpo,
            fragments,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
