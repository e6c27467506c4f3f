//! End-to-end analysis pass over one result directory
//!
//! Loads the run artifacts, resolves the fault timeline and runs the RTO,
//! RPO and steady-state passes. Every fault-dependent metric is absent when
//! the run recorded no fault.

use crate::config::AnalysisConfig;
use crate::csv_output;
use crate::error::{absent_on_degenerate, Result};
use crate::rpo::{estimate_rpo, RpoEstimate};
use crate::rto::{estimate_rto, RtoEstimate};
use crate::steady_state::{analyze_steady_state, SteadyStateReport};
use crate::trace::{
    load_fault_info, load_persisted, load_run_info, load_trace, FaultInfo, PersistedTxnSet,
    ResultDir, RunInfo, TransactionRecord,
};
use crate::workflow::{FaultTimeline, FaultWorkflow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Headline metrics for one run, the row written to metrics.csv
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Mean per-thread interruption time, milliseconds
    pub rto: Option<f64>,
    /// Merged lost-work duration, milliseconds
    pub rpo: Option<f64>,
    /// Seconds from the last fault onset to steady state
    pub recovery_time_factor: Option<f64>,
    pub total_performance_factor: Option<f64>,
    pub absorption_factor: Option<f64>,
    pub recovery_factor: Option<f64>,
}

impl MetricsRecord {
    /// Column names, in file order
    pub const COLUMNS: [&'static str; 6] = [
        "rto",
        "rpo",
        "recovery_time_factor",
        "total_performance_factor",
        "absorption_factor",
        "recovery_factor",
    ];

    /// Values in `COLUMNS` order
    pub fn values(&self) -> [Option<f64>; 6] {
        [
            self.rto,
            self.rpo,
            self.recovery_time_factor,
            self.total_performance_factor,
            self.absorption_factor,
            self.recovery_factor,
        ]
    }

    pub fn from_values(values: [Option<f64>; 6]) -> Self {
        let [rto, rpo, recovery_time_factor, total_performance_factor, absorption_factor, recovery_factor] =
            values;
        Self {
            rto,
            rpo,
            recovery_time_factor,
            total_performance_factor,
            absorption_factor,
            recovery_factor,
        }
    }
}

/// Everything one analysis pass reads from a result directory
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub run: RunInfo,
    pub fault: Option<FaultInfo>,
    pub workflow: Option<FaultWorkflow>,
    pub records: Vec<TransactionRecord>,
    pub persisted: PersistedTxnSet,
}

impl RunArtifacts {
    /// Load and decode every artifact under `dir`
    pub fn load(dir: &ResultDir) -> Result<Self> {
        let run = load_run_info(&dir.path(ResultDir::RUN_INFO))?;
        let fault = load_fault_info(&dir.path(ResultDir::FAULT_INFO))?;
        let records = load_trace(&dir.path(ResultDir::TRACE))?;
        let persisted = load_persisted(&dir.path(ResultDir::PERSISTED))?;
        let workflow = dir
            .workflow_path()
            .map(|path| FaultWorkflow::from_path(&path))
            .transpose()?;

        tracing::info!(
            "loaded {} transactions ({} persisted) from {}",
            records.len(),
            persisted.len(),
            dir.data_dir().display()
        );
        if persisted.is_empty() && !records.is_empty() {
            tracing::warn!("persisted log is empty; every successful transaction counts as lost");
        }

        Ok(Self {
            run,
            fault,
            workflow,
            records,
            persisted,
        })
    }
}

/// Full outcome of one analysis pass
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub metrics: MetricsRecord,
    /// Fault onsets, seconds since run start
    pub onsets: Vec<f64>,
    pub rto: Option<RtoEstimate>,
    pub rpo: Option<RpoEstimate>,
    pub steady_state: Option<SteadyStateReport>,
}

impl RunReport {
    fn without_fault() -> Self {
        Self {
            metrics: MetricsRecord::default(),
            onsets: Vec::new(),
            rto: None,
            rpo: None,
            steady_state: None,
        }
    }

    /// Write metrics.csv and steady_state.csv into the result directory
    pub fn write_to(&self, dir: &ResultDir) -> Result<()> {
        csv_output::write_metrics(&dir.path(ResultDir::METRICS), &self.metrics)?;
        csv_output::write_steady_state(&dir.path(ResultDir::STEADY_STATE), self.steady_state.as_ref())?;
        tracing::debug!("wrote metrics to {}", dir.data_dir().display());
        Ok(())
    }
}

/// Run every pass over loaded artifacts
pub fn analyze(artifacts: &RunArtifacts, config: &AnalysisConfig) -> Result<RunReport> {
    config.validate()?;

    let Some(fault) = artifacts.fault else {
        tracing::warn!("run recorded no fault; fault-dependent metrics are absent");
        return Ok(RunReport::without_fault());
    };

    let rto = absent_on_degenerate(
        estimate_rto(&artifacts.records, &artifacts.run, &fault, config),
        "RTO",
    )?;
    let rpo = estimate_rpo(&artifacts.records, &artifacts.persisted);

    let timeline = FaultTimeline::resolve(&fault, &artifacts.run, artifacts.workflow.as_ref());
    tracing::debug!("fault onsets (s): {:?}", timeline.onsets());
    let steady_state = analyze_steady_state(&artifacts.records, &artifacts.run, &timeline, config)?;

    let headline = steady_state.headline().copied();
    let metrics = MetricsRecord {
        rto: rto.as_ref().map(|r| r.rto_ms),
        rpo: Some(rpo.rpo_ms as f64),
        recovery_time_factor: headline.map(|f| f.recovery_time_factor),
        total_performance_factor: headline.and_then(|f| f.total_performance_factor),
        absorption_factor: headline.and_then(|f| f.absorption_factor),
        recovery_factor: headline.and_then(|f| f.recovery_factor),
    };

    Ok(RunReport {
        metrics,
        onsets: timeline.onsets().to_vec(),
        rto,
        rpo: Some(rpo),
        steady_state: Some(steady_state),
    })
}

/// Load the result directory rooted at `root` and analyze it
pub fn analyze_result_dir(root: &Path, config: &AnalysisConfig) -> Result<RunReport> {
    let dir = ResultDir::new(root);
    let artifacts = RunArtifacts::load(&dir)?;
    analyze(&artifacts, config)
}

fn metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.3}{}", v, unit),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(f, "RTO:                       {}", metric(m.rto, " ms"))?;
        if let Some(rto) = &self.rto {
            writeln!(
                f,
                "  stddev {:.3} ms over {} threads (stall threshold {} ms)",
                rto.stddev_ms, rto.thread_count, rto.stall_threshold_ms
            )?;
            if let Some((from, to)) = rto.diagnostics.longest_gap {
                writeln!(f, "  longest success gap {} ms", to - from)?;
            }
        }
        writeln!(f, "RPO:                       {}", metric(m.rpo, " ms"))?;
        if let Some(rpo) = &self.rpo {
            writeln!(
                f,
                "  {} lost transactions in {} windows",
                rpo.lost_transactions,
                rpo.lost_windows.len()
            )?;
        }
        writeln!(f, "recovery_time_factor:      {}", metric(m.recovery_time_factor, " s"))?;
        writeln!(f, "total_performance_factor:  {}", metric(m.total_performance_factor, ""))?;
        writeln!(f, "absorption_factor:         {}", metric(m.absorption_factor, ""))?;
        writeln!(f, "recovery_factor:           {}", metric(m.recovery_factor, ""))?;

        if let Some(report) = &self.steady_state {
            if report.fragments.len() > 1 {
                writeln!(f)?;
                writeln!(f, "Fault intervals:")?;
                for fragment in &report.fragments {
                    writeln!(
                        f,
                        "  [{:.1}, {:.1}) s: t0 {} s, recovery_factor {}",
                        fragment.interval.start_secs,
                        fragment.interval.end_secs,
                        fragment.factors.recovery_time_factor,
                        metric(fragment.factors.recovery_factor, "")
                    )?;
                }
            }
        }
        Ok(())
    }
}
