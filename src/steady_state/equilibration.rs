// Equilibration search: MSER truncation curve plus an ADF stationarity check
//
// MSER (Marginal Standard Error Rule) scores every candidate truncation
// point d by the squared standard error of the mean of what remains:
//
//     MSE(d) = Var(x[d..]) / (n - d)
//
// A good truncation point removes the transient without throwing away so
// much data that the estimate of the mean becomes noisy.

use crate::numeric::ols;
use serde::Serialize;

/// Average consecutive non-overlapping blocks of `batch_size` samples.
/// A trailing partial block is dropped.
pub fn batch_average(data: &[f64], batch_size: usize) -> Vec<f64> {
    if batch_size <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(batch_size)
        .map(|block| block.iter().sum::<f64>() / batch_size as f64)
        .collect()
}

/// MSER curve over truncation points `0..n-1` (every candidate keeps at
/// least two samples)
pub fn mser_curve(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return Vec::new();
    }

    // variance below the float resolution of the data is rounding noise
    // left by smoothing, not signal
    let scale = data.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let noise_floor = (scale * 1e-12).powi(2);

    // backward Welford pass: variance of every tail in O(n)
    let mut mean = 0.0;
    let mut m2 = 0.0;
    let mut curve = vec![0.0; n - 1];
    for d in (0..n).rev() {
        let count = (n - d) as f64;
        let delta = data[d] - mean;
        mean += delta / count;
        m2 += delta * (data[d] - mean);
        if d < n - 1 {
            let variance = m2 / count;
            curve[d] = if variance <= noise_floor {
                0.0
            } else {
                variance / count
            };
        }
    }
    curve
}

/// First index whose value is less than or equal to every value within
/// `half_window` samples on either side (window clamped at the edges).
///
/// This is the first stable plateau of the curve, which is not necessarily
/// its global minimum. Values within a relative 1e-9 of the curve's largest
/// magnitude compare equal, so rounding noise on flat tails cannot break ties.
pub fn first_plateau(curve: &[f64], half_window: usize) -> Option<usize> {
    let tolerance = curve.iter().fold(0.0f64, |m, v| m.max(v.abs())) * 1e-9;
    (0..curve.len()).find(|&i| {
        let lo = i.saturating_sub(half_window);
        let hi = (i + half_window + 1).min(curve.len());
        curve[lo..hi].iter().all(|&v| curve[i] <= v + tolerance)
    })
}

/// Recovery point of a post-fault throughput segment, in samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equilibration {
    /// Samples from the start of the segment to steady state
    pub t0: usize,
    /// MSER curve over batch-averaged candidates
    pub mse: Vec<f64>,
}

/// Locate the steady-state start of `segment`
pub fn equilibrate(segment: &[f64], batch_size: usize, half_window: usize) -> Equilibration {
    let batch_size = batch_size.max(1);
    let mse = mser_curve(&batch_average(segment, batch_size));
    let t0 = first_plateau(&mse, half_window).unwrap_or(0) * batch_size;
    Equilibration { t0, mse }
}

/// Outcome of an Augmented Dickey-Fuller test (constant, no trend)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfResult {
    /// t-statistic of the lagged level coefficient
    pub statistic: f64,
    /// Number of lagged differences in the regression
    pub lags: usize,
    pub observations: usize,
    /// Critical value at the requested significance level
    pub critical_value: f64,
    /// Unit root rejected: the series is stationary
    pub stationary: bool,
}

/// MacKinnon (2010) response-surface coefficients, constant-only model:
/// critical value = b_inf + b1 / T + b2 / T^2
fn mackinnon_critical_value(significance: f64, observations: usize) -> f64 {
    let (b_inf, b1, b2) = if significance <= 0.01 + 1e-9 {
        (-3.43035, -6.5393, -16.786)
    } else if significance <= 0.05 + 1e-9 {
        (-2.86154, -2.8903, -4.234)
    } else {
        (-2.56677, -1.5384, -2.809)
    };
    let t = observations as f64;
    b_inf + b1 / t + b2 / (t * t)
}

/// Augmented Dickey-Fuller test.
///
/// Regresses `dy[t]` on a constant, `y[t-1]` and `lags` lagged differences,
/// with `lags = floor(12 * (n / 100)^(1/4))` (Schwert) capped at a quarter
/// of the series. Returns `None` for series too short or too flat to fit.
pub fn adf_test(series: &[f64], significance: f64) -> Option<AdfResult> {
    let n = series.len();
    if n < 10 {
        return None;
    }
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    let lags = schwert.min(n / 4);

    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    // diffs[t-1] = y[t] - y[t-1]; row for t uses y[t-1] and diffs[t-2..t-1-lags]
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for t in (lags + 1)..n {
        let mut row = Vec::with_capacity(lags + 2);
        row.push(1.0);
        row.push(series[t - 1]);
        for i in 1..=lags {
            row.push(diffs[t - 1 - i]);
        }
        rows.push(row);
        y.push(diffs[t - 1]);
    }

    let observations = y.len();
    let fit = ols(&rows, &y)?;
    let se = fit.std_errors[1];
    if !se.is_finite() || se <= 0.0 {
        return None;
    }
    let statistic = fit.coefficients[1] / se;
    let critical_value = mackinnon_critical_value(significance, observations);

    Some(AdfResult {
        statistic,
        lags,
        observations,
        critical_value,
        stationary: statistic < critical_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_average() {
        assert_eq!(batch_average(&[1.0, 3.0, 5.0, 7.0, 9.0], 2), vec![2.0, 6.0]);
        assert_eq!(batch_average(&[1.0, 2.0], 1), vec![1.0, 2.0]);
    }

    #[test]
    fn test_mser_step_recovery() {
        // 5 seconds of outage, then back to normal
        let mut segment = vec![0.0; 5];
        segment.extend(vec![100.0; 60]);
        let curve = mser_curve(&segment);
        assert_eq!(curve.len(), 64);
        assert!(curve[0] > 0.0);
        assert_eq!(curve[5], 0.0);
        assert_eq!(first_plateau(&curve, 10), Some(5));
    }

    #[test]
    fn test_first_plateau_is_not_global_minimum() {
        // shallow plateau at 3, deeper minimum at 20
        let mut curve = vec![10.0, 8.0, 6.0, 2.0, 3.0, 4.0, 5.0];
        curve.extend(vec![5.0; 12]);
        curve.extend(vec![1.0, 0.5, 1.0]);
        assert_eq!(first_plateau(&curve, 10), Some(3));
        assert_eq!(first_plateau(&curve, 20), Some(20));
    }

    #[test]
    fn test_rounding_noise_is_flat() {
        let segment: Vec<f64> = (0..40)
            .map(|i| 30.0 + if i % 3 == 0 { 1e-14 } else { -1e-14 })
            .collect();
        assert!(mser_curve(&segment).iter().all(|&v| v == 0.0));
        assert_eq!(equilibrate(&segment, 1, 10).t0, 0);
    }

    #[test]
    fn test_flat_series_recovers_immediately() {
        let eq = equilibrate(&[50.0; 30], 1, 10);
        assert_eq!(eq.t0, 0);
    }

    #[test]
    fn test_equilibrate_with_batches() {
        let mut segment = vec![0.0; 10];
        segment.extend(vec![100.0; 90]);
        let eq = equilibrate(&segment, 5, 10);
        assert_eq!(eq.t0, 10);
    }

    /// Bounded pseudo-random shocks in [-0.5, 0.5) from a fixed LCG
    fn shocks(n: usize) -> Vec<f64> {
        let mut seed: u64 = 12345;
        (0..n)
            .map(|_| {
                seed = seed
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((seed >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_adf_rejects_unit_root_for_mean_reverting_series() {
        let mut state = 0.0;
        let y: Vec<f64> = shocks(400)
            .into_iter()
            .map(|shock| {
                state = 0.2 * state + shock;
                state
            })
            .collect();
        let result = adf_test(&y, 0.05).unwrap();
        assert!(result.stationary, "statistic {}", result.statistic);
    }

    #[test]
    fn test_adf_keeps_unit_root_for_drifting_walk() {
        let mut level = 0.0;
        let y: Vec<f64> = shocks(200)
            .into_iter()
            .map(|shock| {
                level += shock + 0.3;
                level
            })
            .collect();
        let result = adf_test(&y, 0.05).unwrap();
        assert!(!result.stationary, "statistic {}", result.statistic);
    }

    #[test]
    fn test_adf_short_or_flat() {
        assert!(adf_test(&[1.0; 5], 0.05).is_none());
        assert!(adf_test(&[3.0; 100], 0.05).is_none());
    }

    #[test]
    fn test_critical_values_ordered() {
        let one = mackinnon_critical_value(0.01, 200);
        let five = mackinnon_critical_value(0.05, 200);
        let ten = mackinnon_critical_value(0.10, 200);
        assert!(one < five && five < ten);
        assert!((five + 2.876).abs() < 0.01);
    }
}
