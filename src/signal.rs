//! Small numeric helpers shared by the processing and metrics layers

/// Largest absolute value of a slice (0 for an empty slice)
pub fn max_abs(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()))
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Cumulative trapezoidal integral starting at zero, same length as the input
pub fn cumulative_trapezoid(samples: &[f64], dt: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    let mut acc = 0.0;
    for (i, &x) in samples.iter().enumerate() {
        if i > 0 {
            acc += 0.5 * (samples[i - 1] + x) * dt;
        }
        out.push(acc);
    }
    out
}

/// Compute the p-th percentile of a dataset with linear interpolation
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    if p <= 0.0 {
        return sorted[0];
    }
    if p >= 100.0 {
        return sorted[sorted.len() - 1];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}
