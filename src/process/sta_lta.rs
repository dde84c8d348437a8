//! STA/LTA event detection

use crate::trace::{TimeSeries, Trace};

/// Classic STA/LTA characteristic function on squared amplitudes.
///
/// STA and LTA are trailing means over `nsta` and `nlta` samples. The ratio is
/// zero for the first `nlta - 1` samples, where the LTA window is not yet full.
pub fn classic_sta_lta(data: &[f64], nsta: usize, nlta: usize) -> Vec<f64> {
    let n = data.len();
    let nsta = nsta.max(1);
    let nlta = nlta.max(1);

    let mut csum = Vec::with_capacity(n);
    let mut acc = 0.0;
    for &x in data {
        acc += x * x;
        csum.push(acc);
    }

    let window_mean = |i: usize, len: usize| -> f64 {
        if i >= len {
            (csum[i] - csum[i - len]) / len as f64
        } else {
            csum[i] / len as f64
        }
    };

    (0..n)
        .map(|i| {
            if i + 1 < nlta {
                return 0.0;
            }
            let sta = window_mean(i, nsta);
            let lta = window_mean(i, nlta).max(f64::MIN_POSITIVE);
            sta / lta
        })
        .collect()
}

/// Largest STA/LTA ratio of a trace, or `None` if it is shorter than the LTA window
pub fn max_sta_lta(trace: &Trace, sta_window: f64, lta_window: f64) -> Option<f64> {
    let df = trace.sampling_rate();
    let nsta = (sta_window * df).round() as usize;
    let nlta = (lta_window * df).round() as usize;
    if trace.npts() < nlta.max(1) {
        return None;
    }
    classic_sta_lta(&trace.data, nsta, nlta)
        .into_iter()
        .reduce(f64::max)
}

/// True if an impulsive arrival is detectable: max STA/LTA ratio exceeds `threshold`
pub fn check_sta_lta(trace: &Trace, sta_window: f64, lta_window: f64, threshold: f64) -> bool {
    max_sta_lta(trace, sta_window, lta_window).is_some_and(|ratio| ratio > threshold)
}
