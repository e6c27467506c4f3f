//! RTO estimation by per-thread gap analysis
//!
//! Each worker thread completes transactions at a steady cadence. A gap
//! between two consecutive successful completions that is much longer than
//! normal pre-fault latency is an interruption. RTO is the mean, over all
//! threads, of each thread's total interruption time.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::interval::Interval;
use crate::stats;
use crate::trace::{FaultInfo, RunInfo, ThreadId, TransactionRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Interruptions observed on one worker thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreadInterruptions {
    pub gaps: Vec<(u64, u64)>,
    pub total_ms: u64,
}

/// Whole-trace diagnostics carried alongside the estimate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GapDiagnostics {
    /// Longest gap between consecutive successful completions, any thread
    pub longest_gap: Option<(u64, u64)>,
    /// Time from fault end to the first successful transaction that
    /// started after it, milliseconds
    pub first_success_after_fault_ms: Option<u64>,
}

/// Outcome of the RTO pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RtoEstimate {
    /// Mean interruption time per thread, milliseconds
    pub rto_ms: f64,
    /// Population standard deviation of per-thread interruption time
    pub stddev_ms: f64,
    pub thread_count: usize,
    /// Baseline latency (configured percentile) before the fault, if any
    /// transaction completed in that window
    pub baseline_latency_ms: Option<f64>,
    pub stall_threshold_ms: f64,
    pub per_thread: BTreeMap<ThreadId, ThreadInterruptions>,
    pub diagnostics: GapDiagnostics,
}

/// Successful records per thread, each partition sorted by `end`
pub fn successful_by_thread(
    records: &[TransactionRecord],
) -> BTreeMap<ThreadId, Vec<&TransactionRecord>> {
    let mut threads: BTreeMap<ThreadId, Vec<&TransactionRecord>> = BTreeMap::new();
    for record in records {
        let entry = threads.entry(record.thread_id()).or_default();
        if record.is_success() {
            entry.push(record);
        }
    }
    for partition in threads.values_mut() {
        partition.sort_by_key(|r| r.end);
    }
    threads
}

/// Baseline latency: the configured percentile of `end - start` over
/// successful transactions ending strictly inside (ramp-up end, fault onset)
pub fn baseline_latency_ms(
    records: &[TransactionRecord],
    run: &RunInfo,
    fault_onset_ms: u64,
    percentile: f64,
) -> Result<f64> {
    let rampup_end = run.rampup_end_ms();
    let latencies: Vec<f64> = records
        .iter()
        .filter(|r| r.is_success() && r.end > rampup_end && r.end < fault_onset_ms)
        .map(|r| r.latency_ms() as f64)
        .collect();
    if latencies.is_empty() {
        return Err(AnalysisError::degenerate(
            "no successful transactions between ramp-up end and fault onset",
        ));
    }
    stats::quantile(&latencies, percentile)
}

/// Gaps in one thread's end-sorted successful records that exceed
/// `threshold_ms`, considering only pairs whose later record ends after
/// `rampup_end_ms`
pub fn thread_interruptions(
    sorted: &[&TransactionRecord],
    rampup_end_ms: u64,
    threshold_ms: f64,
) -> ThreadInterruptions {
    let gaps: Vec<(u64, u64)> = sorted
        .windows(2)
        .filter(|pair| pair[1].end > rampup_end_ms)
        .filter(|pair| (pair[1].end - pair[0].end) as f64 > threshold_ms)
        .map(|pair| (pair[0].end, pair[1].end))
        .collect();
    let total_ms = gaps.iter().map(|(a, b)| b - a).sum();
    ThreadInterruptions { gaps, total_ms }
}

fn gap_diagnostics(records: &[TransactionRecord], fault: &FaultInfo) -> GapDiagnostics {
    let mut ends: Vec<&TransactionRecord> = records.iter().filter(|r| r.is_success()).collect();
    ends.sort_by_key(|r| r.end);

    let longest_gap = ends
        .windows(2)
        .map(|pair| Interval::new(pair[0].end, pair[1].end))
        .max_by_key(|gap| (gap.duration_ms(), std::cmp::Reverse(gap.start)))
        .filter(|gap| gap.duration_ms() > 0)
        .map(|gap| (gap.start, gap.end));

    let fault_end = fault.end();
    let first_success_after_fault_ms = records
        .iter()
        .filter(|r| r.is_success() && r.start > fault_end)
        .map(|r| r.end)
        .min()
        .map(|end| end.saturating_sub(fault_end));

    GapDiagnostics {
        longest_gap,
        first_success_after_fault_ms,
    }
}

/// Estimate RTO for a trace with one (first) fault
pub fn estimate_rto(
    records: &[TransactionRecord],
    run: &RunInfo,
    fault: &FaultInfo,
    config: &AnalysisConfig,
) -> Result<RtoEstimate> {
    let threads = successful_by_thread(records);
    if threads.is_empty() {
        return Err(AnalysisError::degenerate("trace has no worker threads"));
    }

    let baseline = match baseline_latency_ms(records, run, fault.start, config.baseline_percentile)
    {
        Ok(latency) => Some(latency),
        Err(AnalysisError::DegenerateInput(reason)) => {
            tracing::warn!("{}; stall threshold falls back to the floor", reason);
            None
        }
        Err(e) => return Err(e),
    };
    let threshold = config.stall_threshold_ms(baseline);
    tracing::debug!(
        "baseline latency {:?} ms, stall threshold {} ms",
        baseline,
        threshold
    );

    let rampup_end = run.rampup_end_ms();
    let per_thread: BTreeMap<ThreadId, ThreadInterruptions> = threads
        .iter()
        .map(|(&thread, sorted)| (thread, thread_interruptions(sorted, rampup_end, threshold)))
        .collect();

    for (thread, interruptions) in &per_thread {
        if interruptions.total_ms > 0 {
            tracing::debug!(
                "thread {}: {} interruptions, {} ms",
                thread,
                interruptions.gaps.len(),
                interruptions.total_ms
            );
        }
    }

    let sums: Vec<f64> = per_thread.values().map(|t| t.total_ms as f64).collect();
    let summary = stats::summarize(&sums)?;

    let diagnostics = gap_diagnostics(records, fault);
    if let Some((from, to)) = diagnostics.longest_gap {
        tracing::debug!("longest success gap: {} ms ({} .. {})", to - from, from, to);
    }

    tracing::info!(
        "RTO: {:.1} ms (stddev {:.1}) over {} threads",
        summary.mean,
        summary.stddev,
        per_thread.len()
    );

    Ok(RtoEstimate {
        rto_ms: summary.mean,
        stddev_ms: summary.stddev,
        thread_count: per_thread.len(),
        baseline_latency_ms: baseline,
        stall_threshold_ms: threshold,
        per_thread,
        diagnostics,
    })
}
