// Steady-state analysis of throughput around injected faults
//
// For every fault interval the analyzer finds where throughput settles into a
// new steady state and how far it fell on the way there:
//
// 1. Per-second completion counts over the whole run (errors included).
// 2. Desired throughput: mean over [ramp-up end, first fault).
// 3. Savitzky-Golay smoothing of the full series.
// 4. MSER equilibration over the smoothed [fault start, period end) segment;
//    the recovery point t0 is the first plateau of the MSE curve.
// 5. Ratios of raw throughput to desired throughput before and after t0.
//
// An ADF test on the post-t0 smoothed segment reports whether the new regime
// is statistically stationary.

mod equilibration;
mod factors;
mod smoothing;
mod throughput;

pub use equilibration::{
    adf_test, batch_average, equilibrate, first_plateau, mser_curve, AdfResult, Equilibration,
};
pub use factors::{recovery_factors, RecoveryFactors};
pub use smoothing::savgol_smooth;
pub use throughput::ThroughputSeries;

use crate::config::AnalysisConfig;
use crate::error::absent_on_degenerate;
use crate::error::Result;
use crate::trace::{RunInfo, TransactionRecord};
use crate::workflow::{FaultInterval, FaultTimeline};
use serde::Serialize;

/// Steady-state metrics for one fault interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteadyStateFragment {
    pub interval: FaultInterval,
    pub factors: RecoveryFactors,
    /// Stationarity of the smoothed segment after `t0`
    pub adf: Option<AdfResult>,
}

/// Steady-state metrics for a whole run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteadyStateReport {
    pub desired_performance: Option<f64>,
    pub fragments: Vec<SteadyStateFragment>,
}

impl SteadyStateReport {
    /// The run's headline factors: those of the last fault interval
    pub fn headline(&self) -> Option<&RecoveryFactors> {
        self.fragments.last().map(|f| &f.factors)
    }
}

/// Bucket range `[start, end)` covered by `interval`. Both ends floor, so an
/// interval stops before the bucket holding the next fault's onset.
fn segment_bounds(interval: FaultInterval, len: usize) -> (usize, usize) {
    let start = (interval.start_secs.max(0.0).floor() as usize).min(len);
    let end = (interval.end_secs.max(0.0).floor() as usize).clamp(start, len);
    (start, end)
}

/// Analyze one fault interval against a prepared throughput series
pub fn analyze_interval(
    throughput: &[f64],
    smoothed: &[f64],
    interval: FaultInterval,
    desired: Option<f64>,
    config: &AnalysisConfig,
) -> SteadyStateFragment {
    let (start, end) = segment_bounds(interval, smoothed.len());
    let segment = &smoothed[start..end];

    let eq = equilibrate(segment, config.mser_batch_size, config.plateau_half_window);
    let t0 = eq.t0.min(segment.len());
    let adf = adf_test(&segment[t0..], config.adf_significance);

    tracing::info!(
        "fault interval [{}, {}) s: steady state after {} s",
        interval.start_secs,
        interval.end_secs,
        t0
    );
    match &adf {
        Some(result) => tracing::debug!(
            "ADF statistic {:.3} (critical {:.3}, {} lags): stationary={}",
            result.statistic,
            result.critical_value,
            result.lags,
            result.stationary
        ),
        None => tracing::debug!("ADF test skipped: post-recovery segment too short or flat"),
    }

    SteadyStateFragment {
        interval,
        factors: recovery_factors(throughput, start, t0, desired, config.recovery_window_secs),
        adf,
    }
}

/// Run the steady-state analysis for every fault interval of `timeline`
pub fn analyze_steady_state(
    records: &[TransactionRecord],
    run: &RunInfo,
    timeline: &FaultTimeline,
    config: &AnalysisConfig,
) -> Result<SteadyStateReport> {
    let series = ThroughputSeries::from_trace(records, run);
    analyze_series(&series, run.rampup_end_secs(), timeline, config)
}

/// Steady-state analysis over an already-built throughput series
pub fn analyze_series(
    series: &ThroughputSeries,
    rampup_end_secs: usize,
    timeline: &FaultTimeline,
    config: &AnalysisConfig,
) -> Result<SteadyStateReport> {
    let desired = match timeline.first_onset() {
        Some(onset) => absent_on_degenerate(
            series.desired_performance(rampup_end_secs, onset),
            "desired performance",
        )?,
        None => None,
    };
    if let Some(desired) = desired {
        tracing::debug!("desired performance: {:.2} txn/s", desired);
    }

    let smoothed = savgol_smooth(series.values(), config.smoothing_window, config.smoothing_order);
    let fragments = timeline
        .intervals()
        .into_iter()
        .map(|interval| analyze_interval(series.values(), &smoothed, interval, desired, config))
        .collect();

    Ok(SteadyStateReport {
        desired_performance: desired,
        fragments,
    })
}
