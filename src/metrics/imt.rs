//! Intensity measure types

use crate::metrics::oscillator::pseudo_acceleration;
use crate::signal::cumulative_trapezoid;
use ndarray::ArrayView1;
use std::f64::consts::PI;
use std::fmt;

/// Standard gravity in m/s/s
pub const GRAVITY: f64 = 9.80665;

/// Physical quantity reduced from one acceleration component
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imt {
    /// Peak ground acceleration, %g
    Pga,
    /// Peak ground velocity, cm/s
    Pgv,
    /// Pseudo-spectral acceleration at a natural period (s), %g
    Sa(f64),
    /// Arias intensity, m/s
    Arias,
}

impl Imt {
    /// Parse `pga`, `pgv`, `arias`, `sa1.0` or `sa(1.0)`; `None` if unrecognised
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "pga" => Some(Imt::Pga),
            "pgv" => Some(Imt::Pgv),
            "arias" => Some(Imt::Arias),
            _ => {
                let rest = name.strip_prefix("sa")?;
                let rest = rest
                    .strip_prefix('(')
                    .and_then(|r| r.strip_suffix(')'))
                    .unwrap_or(rest);
                let period: f64 = rest.trim().parse().ok()?;
                (period.is_finite() && period >= 0.0).then_some(Imt::Sa(period))
            }
        }
    }

    /// Canonical table key, e.g. `PGA` or `SA(1.0)`
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Per-sample response to acceleration in cm/s/s.
    ///
    /// The response is linear in the input, so it can be computed once per
    /// channel and rotated afterwards.
    pub fn response(&self, acc_cgs: &[f64], dt: f64, damping: f64) -> Vec<f64> {
        match *self {
            Imt::Pga => acc_cgs.to_vec(),
            Imt::Pgv => cumulative_trapezoid(acc_cgs, dt),
            Imt::Sa(period) => pseudo_acceleration(acc_cgs, dt, period, damping),
            Imt::Arias => acc_cgs.iter().map(|a| a / 100.0).collect(),
        }
    }

    /// Reduce a response series to the reported scalar
    pub fn reduce(&self, response: ArrayView1<f64>, dt: f64) -> f64 {
        let peak = || response.fold(0.0f64, |acc, &x| acc.max(x.abs()));
        match self {
            Imt::Pga | Imt::Sa(_) => peak() / GRAVITY,
            Imt::Pgv => peak(),
            Imt::Arias => {
                let n = response.len();
                if n < 2 {
                    return 0.0;
                }
                let sum_sq = response.dot(&response);
                let ends = response[0].powi(2) + response[n - 1].powi(2);
                PI / (2.0 * GRAVITY) * (sum_sq - 0.5 * ends) * dt
            }
        }
    }

    /// Value for one component of acceleration in cm/s/s
    pub fn compute(&self, acc_cgs: &[f64], dt: f64, damping: f64) -> f64 {
        let response = self.response(acc_cgs, dt, damping);
        self.reduce(ArrayView1::from(&response[..]), dt)
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imt::Pga => f.write_str("PGA"),
            Imt::Pgv => f.write_str("PGV"),
            Imt::Arias => f.write_str("ARIAS"),
            Imt::Sa(period) if period.fract() == 0.0 => write!(f, "SA({:.1})", period),
            Imt::Sa(period) => write!(f, "SA({})", period),
        }
    }
}
