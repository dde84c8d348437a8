//! Amplitude gate: reject dead channels and gain/unit blunders

use crate::trace::Trace;

/// Check that the peak absolute amplitude lies within `[min_amp, max_amp]`.
///
/// Thresholds are in cm/s/s; traces in SI units are scaled before comparison.
/// Both boundaries pass.
pub fn check_max_amplitude(trace: &Trace, min_amp: f64, max_amp: f64) -> bool {
    let peak = trace.max_abs() * trace.stats.units.to_cgs_factor();
    !(peak < min_amp || peak > max_amp)
}
