// Performance-ratio factors for one fault interval

use crate::stats;
use serde::Serialize;

/// Degradation and recovery ratios relative to the desired throughput
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryFactors {
    /// Seconds from fault onset to steady state (`t0`)
    pub recovery_time_factor: f64,
    /// Mean throughput during `[fault, fault + t0)` over desired
    pub total_performance_factor: Option<f64>,
    /// Worst single second during `[fault, fault + t0)` over desired
    pub absorption_factor: Option<f64>,
    /// Mean throughput over the window after `t0` over desired
    pub recovery_factor: Option<f64>,
}

/// Compute the factors for a fault starting at second `fault_start`.
///
/// `throughput` is the raw per-second series for the whole run. The
/// transient ratios are absent when `t0 == 0` (nothing to measure) and every
/// ratio is absent without a positive `desired` throughput.
pub fn recovery_factors(
    throughput: &[f64],
    fault_start: usize,
    t0: usize,
    desired: Option<f64>,
    recovery_window_secs: usize,
) -> RecoveryFactors {
    let len = throughput.len();
    let ratio = |value: f64| desired.filter(|d| *d > 0.0).map(|d| value / d);

    let transient = &throughput[fault_start.min(len)..(fault_start + t0).min(len)];
    let (total_performance_factor, absorption_factor) = if t0 > 0 && !transient.is_empty() {
        (
            stats::mean(transient).ok().and_then(ratio),
            stats::min(transient).ok().and_then(ratio),
        )
    } else {
        (None, None)
    };

    let recovered_from = (fault_start + t0).min(len);
    let recovered_to = (recovered_from + recovery_window_secs).min(len);
    let recovery_factor = stats::mean(&throughput[recovered_from..recovered_to])
        .ok()
        .and_then(ratio);

    RecoveryFactors {
        recovery_time_factor: t0 as f64,
        total_performance_factor,
        absorption_factor,
        recovery_factor,
    }
}
