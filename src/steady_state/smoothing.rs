// Savitzky-Golay smoothing
//
// Each output sample is the value, at that sample, of a least-squares
// polynomial fitted over a fixed-length window. Interior windows start
// `window / 2` samples before the output sample; near the edges the window
// is clamped inside the series and the edge polynomial is evaluated at the
// off-centre position.

use crate::numeric::{polyfit, polyval};

/// Smooth `series` with a `window`-sample, `order`-degree polynomial filter.
///
/// Series shorter than the window are fitted with one polynomial over the
/// whole series; series too short for any fit are returned unchanged.
pub fn savgol_smooth(series: &[f64], window: usize, order: usize) -> Vec<f64> {
    let n = series.len();
    if n <= order || window <= order {
        return series.to_vec();
    }
    let window = window.min(n);
    let half = window / 2;

    let mut out = Vec::with_capacity(n);
    // windows repeat at both edges; fit those once
    let mut cached: Option<(usize, Vec<f64>)> = None;

    for i in 0..n {
        let start = i.saturating_sub(half).min(n - window);
        let coefficients = match &cached {
            Some((cached_start, c)) if *cached_start == start => c.clone(),
            _ => {
                let x: Vec<f64> = (0..window).map(|k| k as f64).collect();
                match polyfit(&x, &series[start..start + window], order) {
                    Some(c) => {
                        cached = Some((start, c.clone()));
                        c
                    }
                    None => {
                        out.push(series[i]);
                        continue;
                    }
                }
            }
        };
        out.push(polyval(&coefficients, (i - start) as f64));
    }
    out
}
