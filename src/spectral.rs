//! Spectral utilities (amplitude spectra, fractional-octave smoothing)

use rustfft::{num_complex::Complex64, FftPlanner};

/// One-sided amplitude spectrum
#[derive(Debug, Clone)]
pub struct AmplitudeSpectrum {
    /// Fourier amplitude per bin, scaled by the sample interval
    pub amplitudes: Vec<f64>,
    /// Bin frequencies in Hz
    pub freqs: Vec<f64>,
}

/// Next power of two that is >= `n` (and at least 2)
pub fn next_pow2(n: usize) -> usize {
    n.max(2).next_power_of_two()
}

/// Amplitude spectrum of `y`, zero padded to `n_fft` points
pub fn amplitude_spectrum(y: &[f64], dt: f64, n_fft: usize) -> AmplitudeSpectrum {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let mut buffer: Vec<Complex64> = y
        .iter()
        .take(n_fft)
        .map(|&x| Complex64::new(x, 0.0))
        .collect();
    buffer.resize(n_fft, Complex64::new(0.0, 0.0));

    fft.process(&mut buffer);

    let n_bins = n_fft / 2 + 1;
    let amplitudes: Vec<f64> = buffer[..n_bins].iter().map(|c| c.norm() * dt).collect();
    let freqs: Vec<f64> = (0..n_bins).map(|i| i as f64 / (n_fft as f64 * dt)).collect();

    AmplitudeSpectrum { amplitudes, freqs }
}

/// Smooth a spectrum with a running mean over a constant fraction of an octave.
///
/// Each bin is replaced by the mean of the bins within `[f / 2^(w/2), f * 2^(w/2)]`.
/// The DC bin is left untouched. `freqs` must be increasing and evenly spaced.
pub fn smooth_fractional_octave(signal: &[f64], freqs: &[f64], octaves: f64) -> Vec<f64> {
    if octaves <= 0.0 || signal.len() < 3 {
        return signal.to_vec();
    }

    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0);
    for &v in signal {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    let half_width = 2.0f64.powf(octaves / 2.0);
    let df = freqs[1] - freqs[0];
    let last = signal.len() - 1;

    let mut smoothed = signal.to_vec();
    for i in 1..signal.len() {
        let lo = ((freqs[i] / half_width) / df).ceil().max(1.0) as usize;
        let hi = (((freqs[i] * half_width) / df).floor() as usize).min(last);
        let (lo, hi) = (lo.min(i), hi.max(i));
        smoothed[i] = (prefix[hi + 1] - prefix[lo]) / (hi - lo + 1) as f64;
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_spectrum_peak_at_tone() {
        let dt = 0.01;
        let n = 1024;
        // 12.5 Hz lands exactly on bin 128 of a 1024-point FFT at 100 Hz
        let y: Vec<f64> = (0..n).map(|i| (2.0 * PI * 12.5 * i as f64 * dt).sin()).collect();
        let spec = amplitude_spectrum(&y, dt, n);

        assert_eq!(spec.freqs.len(), n / 2 + 1);
        assert!((spec.freqs[n / 2] - 50.0).abs() < 1e-9);

        let peak = spec
            .amplitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 128);
    }

    #[test]
    fn test_smoothing_preserves_flat_spectrum() {
        let freqs: Vec<f64> = (0..513).map(|i| i as f64 * 0.1).collect();
        let flat = vec![2.0; 513];
        let smoothed = smooth_fractional_octave(&flat, &freqs, 1.0 / 3.0);
        for v in &smoothed {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 2);
        assert_eq!(next_pow2(1000), 1024);
        assert_eq!(next_pow2(1024), 1024);
    }
}
