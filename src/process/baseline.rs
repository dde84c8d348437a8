//! Baseline correction by polynomial fit to displacement

use crate::signal::cumulative_trapezoid;
use ndarray::{Array1, Array2};
use std::fmt;

/// Polynomial powers fitted to the displacement; the constant and linear terms
/// are left out so initial displacement and velocity stay untouched.
const MIN_POWER: usize = 2;
const MAX_POWER: usize = 6;

/// Why a baseline fit could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineFailure {
    TooShort,
    SingularFit,
    NonFinite,
}

impl fmt::Display for BaselineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineFailure::TooShort => f.write_str("too few samples for a polynomial fit"),
            BaselineFailure::SingularFit => f.write_str("polynomial fit is singular"),
            BaselineFailure::NonFinite => f.write_str("correction produced non-finite samples"),
        }
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let scale = a.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-14 * scale {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

/// Fit a 6th-order polynomial (no constant or linear term) to the doubly
/// integrated acceleration and subtract its second derivative in place.
pub fn correct_baseline(acc: &mut [f64], dt: f64) -> Result<(), BaselineFailure> {
    let n = acc.len();
    let n_terms = MAX_POWER - MIN_POWER + 1;
    if n <= n_terms {
        return Err(BaselineFailure::TooShort);
    }

    let vel = cumulative_trapezoid(acc, dt);
    let disp = cumulative_trapezoid(&vel, dt);

    // Normalised time keeps the normal equations well conditioned
    let span = (n - 1) as f64 * dt;
    let tau: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();

    let mut ata = Array2::<f64>::zeros((n_terms, n_terms));
    let mut atb = Array1::<f64>::zeros(n_terms);
    let mut row = vec![0.0; n_terms];
    for (i, &t) in tau.iter().enumerate() {
        for (k, value) in row.iter_mut().enumerate() {
            *value = t.powi((k + MIN_POWER) as i32);
        }
        for r in 0..n_terms {
            atb[r] += row[r] * disp[i];
            for c in 0..n_terms {
                ata[[r, c]] += row[r] * row[c];
            }
        }
    }

    let coeffs = solve(ata, atb).ok_or(BaselineFailure::SingularFit)?;

    for (i, a) in acc.iter_mut().enumerate() {
        let t = tau[i];
        let curvature: f64 = coeffs
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let p = (k + MIN_POWER) as i32;
                c * (p * (p - 1)) as f64 * t.powi(p - 2)
            })
            .sum();
        *a -= curvature / (span * span);
    }

    if acc.iter().any(|x| !x.is_finite()) {
        return Err(BaselineFailure::NonFinite);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::max_abs;

    #[test]
    fn test_constant_offset_removed() {
        // A constant acceleration offset integrates to a pure t^2 displacement
        let mut acc = vec![0.3; 2001];
        correct_baseline(&mut acc, 0.01).unwrap();
        assert!(max_abs(&acc) < 1e-6);
    }

    #[test]
    fn test_final_displacement_reduced() {
        let dt = 0.01;
        let n = 4001;
        let mut acc: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 * dt;
                (2.0 * std::f64::consts::PI * 1.5 * t).sin() * (-0.2 * t).exp() + 0.05
            })
            .collect();

        let before = *cumulative_trapezoid(&cumulative_trapezoid(&acc, dt), dt)
            .last()
            .unwrap();
        correct_baseline(&mut acc, dt).unwrap();
        let after = *cumulative_trapezoid(&cumulative_trapezoid(&acc, dt), dt)
            .last()
            .unwrap();

        assert!(after.abs() < 0.1 * before.abs());
    }

    #[test]
    fn test_short_trace_fails_zero_trace_unchanged() {
        assert_eq!(
            correct_baseline(&mut [1.0, 2.0, 3.0], 0.01),
            Err(BaselineFailure::TooShort)
        );
        let mut zeros = vec![0.0; 100];
        assert_eq!(correct_baseline(&mut zeros, 0.01), Ok(()));
        assert!(zeros.iter().all(|&x| x == 0.0));
    }
}
