//! Damped single-degree-of-freedom oscillator response

use std::f64::consts::PI;

/// Relative displacement of a damped oscillator driven by base acceleration.
///
/// Solves `u'' + 2ζωu' + ω²u = -a(t)` exactly for input that is piecewise
/// linear between samples (Nigam & Jennings, 1969). Starts at rest.
pub fn relative_displacement(acc: &[f64], dt: f64, period: f64, damping: f64) -> Vec<f64> {
    let n = acc.len();
    let mut u = vec![0.0; n];
    if n < 2 {
        return u;
    }

    let w = 2.0 * PI / period;
    let w2 = w * w;
    let w3 = w2 * w;
    let z = damping;
    let sq = (1.0 - z * z).sqrt();
    let wd = w * sq;

    let e = (-z * w * dt).exp();
    let s = (wd * dt).sin();
    let c = (wd * dt).cos();

    let a11 = e * (z / sq * s + c);
    let a12 = e * s / wd;
    let a21 = -w / sq * e * s;
    let a22 = e * (c - z / sq * s);

    let t1 = (2.0 * z * z - 1.0) / (w2 * dt);
    let t2 = 2.0 * z / (w3 * dt);
    let cs = c - z / sq * s;
    let ds = wd * s + z * w * c;

    let b11 = e * ((t1 + z / w) * s / wd + (t2 + 1.0 / w2) * c) - t2;
    let b12 = -e * (t1 * s / wd + t2 * c) - 1.0 / w2 + t2;
    let b21 = e * ((t1 + z / w) * cs - (t2 + 1.0 / w2) * ds) + 1.0 / (w2 * dt);
    let b22 = -e * (t1 * cs - t2 * ds) - 1.0 / (w2 * dt);

    let mut v = 0.0;
    for i in 0..n - 1 {
        let (a0, a1) = (acc[i], acc[i + 1]);
        let ui = u[i];
        u[i + 1] = a11 * ui + a12 * v + b11 * a0 + b12 * a1;
        v = a21 * ui + a22 * v + b21 * a0 + b22 * a1;
    }
    u
}

/// Pseudo-acceleration time series `ω² u(t)`, same units as `acc`.
///
/// A non-positive period is the infinitely stiff oscillator: the ground
/// acceleration itself.
pub fn pseudo_acceleration(acc: &[f64], dt: f64, period: f64, damping: f64) -> Vec<f64> {
    if period <= 0.0 {
        return acc.to_vec();
    }
    let w = 2.0 * PI / period;
    relative_displacement(acc, dt, period, damping)
        .into_iter()
        .map(|u| w * w * u)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::max_abs;

    #[test]
    fn test_static_load_settles_at_static_deflection() {
        let period = 0.5;
        let w = 2.0 * PI / period;
        let acc = vec![3.0; 5000];
        let u = relative_displacement(&acc, 0.01, period, 0.05);
        assert!((u[4999] + 3.0 / (w * w)).abs() < 1e-4);
    }

    #[test]
    fn test_resonance_amplifies() {
        let dt = 0.01;
        let acc: Vec<f64> = (0..3000)
            .map(|i| (2.0 * PI * i as f64 * dt).sin())
            .collect();
        let psa = max_abs(&pseudo_acceleration(&acc, dt, 1.0, 0.05));
        // Steady-state amplification at resonance is 1 / (2ζ) = 10
        assert!(psa > 8.0 && psa < 10.5, "psa = {psa}");
    }

    #[test]
    fn test_zero_period_is_ground_motion() {
        let acc = vec![0.0, 1.0, -2.0];
        assert_eq!(pseudo_acceleration(&acc, 0.01, 0.0, 0.05), acc);
    }
}
