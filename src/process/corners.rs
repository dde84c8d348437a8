//! Corner frequency selection from the signal-to-noise ratio

use crate::config::Config;
use crate::error::Result;
use crate::event::EventInfo;
use crate::process::split::{split_signal_and_noise, SplitMethod, SplitOutcome};
use crate::spectral::{amplitude_spectrum, next_pow2, smooth_fractional_octave};
use crate::trace::{TimeSeries, Trace};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of the corner frequency search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CornerFrequencies {
    /// Usable bandwidth in Hz, `low < high`
    Found { low: f64, high: f64 },
    /// The trace could not be split into noise and signal
    NoSplit,
    /// No band around the reference band clears the SNR threshold
    InsufficientSnr,
}

impl CornerFrequencies {
    /// Legacy pair rendering: `[-1, -1]` for no split, `[-2, -2]` for poor SNR
    pub fn as_pair(&self) -> [f64; 2] {
        match *self {
            CornerFrequencies::Found { low, high } => [low, high],
            CornerFrequencies::NoSplit => [-1.0, -1.0],
            CornerFrequencies::InsufficientSnr => [-2.0, -2.0],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CornerFrequencies::Found { .. })
    }
}

/// Parameters of the corner search
#[derive(Debug, Clone)]
pub struct CornerParams {
    pub ratio: f64,
    pub split_method: SplitMethod,
    pub p_velocity: f64,
    pub default_low: f64,
    pub default_high: f64,
    pub reference_band: [f64; 2],
    pub smoothing_octaves: f64,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CornerParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ratio: config.corners.snr_ratio,
            split_method: config.split.method,
            p_velocity: config.split.p_velocity,
            default_low: config.corners.default_low_frequency,
            default_high: config.corners.default_high_frequency,
            reference_band: config.corners.reference_band,
            smoothing_octaves: config.corners.smoothing_octaves,
        }
    }
}

/// Contiguous run of passing bins that covers the whole reference band.
///
/// Returns the inclusive bin range, or `None` when the reference band holds no
/// bin or any of its bins fails the threshold. Bin 0 (DC) is never considered.
fn passing_band(
    snr: &[f64],
    freqs: &[f64],
    ratio: f64,
    reference_band: [f64; 2],
) -> Option<(usize, usize)> {
    let passes = |i: usize| snr[i] >= ratio;

    let ref_bins: Vec<usize> = (1..freqs.len())
        .filter(|&i| freqs[i] >= reference_band[0] && freqs[i] <= reference_band[1])
        .collect();
    let (&first, &last) = (ref_bins.first()?, ref_bins.last()?);
    if !ref_bins.iter().all(|&i| passes(i)) {
        return None;
    }

    let mut lo = first;
    while lo > 1 && passes(lo - 1) {
        lo -= 1;
    }
    let mut hi = last;
    while hi + 1 < snr.len() && passes(hi + 1) {
        hi += 1;
    }
    Some((lo, hi))
}

/// Select high-pass and low-pass corners from the signal-to-noise ratio.
///
/// Missing event metadata for the configured split method is an error; a
/// split point outside the trace is reported as [`CornerFrequencies::NoSplit`].
pub fn get_corner_frequencies(
    trace: &Trace,
    event: &EventInfo,
    params: &CornerParams,
) -> Result<CornerFrequencies> {
    let outcome = split_signal_and_noise(trace, event, params.split_method, params.p_velocity)?;
    let window = match outcome {
        SplitOutcome::Split(window) => window,
        SplitOutcome::OutsideTrace => return Ok(CornerFrequencies::NoSplit),
    };

    let dt = trace.delta();
    let split_idx = (trace.offset_of(window.signal_start) / dt).round() as usize;
    let (noise, signal) = trace.data.split_at(split_idx.min(trace.npts()));
    if noise.len() < 2 || signal.len() < 2 {
        return Ok(CornerFrequencies::NoSplit);
    }

    // Common FFT length so noise and signal bins line up
    let n_fft = next_pow2(noise.len().max(signal.len()));
    let noise_spec = amplitude_spectrum(noise, dt, n_fft);
    let signal_spec = amplitude_spectrum(signal, dt, n_fft);
    let freqs = signal_spec.freqs;

    let octaves = params.smoothing_octaves;
    let noise_smooth = smooth_fractional_octave(&noise_spec.amplitudes, &freqs, octaves);
    let signal_smooth = smooth_fractional_octave(&signal_spec.amplitudes, &freqs, octaves);

    let snr: Vec<f64> = signal_smooth
        .iter()
        .zip(&noise_smooth)
        .map(|(s, n)| s / n.max(f64::MIN_POSITIVE))
        .collect();

    let Some((lo_bin, hi_bin)) = passing_band(&snr, &freqs, params.ratio, params.reference_band)
    else {
        debug!(
            "{}: reference band {:?} does not clear SNR {}",
            trace.id(),
            params.reference_band,
            params.ratio
        );
        return Ok(CornerFrequencies::InsufficientSnr);
    };

    let corners = clip_corners(
        freqs[lo_bin],
        freqs[hi_bin],
        trace.duration(),
        0.5 * trace.sampling_rate(),
    );
    match corners {
        CornerFrequencies::Found { low, high } => {
            debug!("{}: corners {:.4} - {:.4} Hz", trace.id(), low, high)
        }
        _ => debug!(
            "{}: corner pair out of order ({:.4}, {:.4})",
            trace.id(),
            freqs[lo_bin],
            freqs[hi_bin]
        ),
    }
    Ok(corners)
}

/// Clip a passing band to `[1 / duration, nyquist]`; a pair left out of order
/// counts as insufficient SNR
fn clip_corners(low: f64, high: f64, duration: f64, nyquist: f64) -> CornerFrequencies {
    let low = low.max(1.0 / duration);
    let high = high.min(nyquist);
    if low >= high {
        return CornerFrequencies::InsufficientSnr;
    }
    CornerFrequencies::Found { low, high }
}
