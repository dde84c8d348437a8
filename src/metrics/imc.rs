//! Intensity measure components: how channel orientations are combined

use crate::error::{GmError, Result};
use crate::metrics::imt::Imt;
use crate::signal::percentile;
use crate::stream::Stream;
use crate::trace::{TimeSeries, Trace};
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;
use std::fmt;

const DEFAULT_PERCENTILE: f64 = 50.0;

/// Component combination rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imc {
    /// One value per physical channel, labelled by channel code
    Channels,
    /// Larger of the two horizontal values
    GreaterOfTwoHorizontals,
    /// Percentile over single rotated components, 0-180 degrees
    RotD(f64),
    /// Percentile over geometric means of rotated orthogonal pairs, 0-90 degrees
    GmRotD(f64),
}

fn parse_percentile(rest: &str) -> Option<f64> {
    let rest = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest)
        .trim();
    if rest.is_empty() {
        return Some(DEFAULT_PERCENTILE);
    }
    let p: f64 = rest.parse().ok()?;
    (0.0..=100.0).contains(&p).then_some(p)
}

impl Imc {
    /// Parse `channels`, `greater_of_two_horizontals`, `rotd50`, `gmrotd(50)`;
    /// bare `rotd`/`gmrotd` mean the median. `None` if unrecognised.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "channels" => Some(Imc::Channels),
            "greater_of_two_horizontals" => Some(Imc::GreaterOfTwoHorizontals),
            _ => {
                if let Some(rest) = name.strip_prefix("gmrotd") {
                    parse_percentile(rest).map(Imc::GmRotD)
                } else if let Some(rest) = name.strip_prefix("rotd") {
                    parse_percentile(rest).map(Imc::RotD)
                } else {
                    None
                }
            }
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Compute `imt` under this combination rule.
    ///
    /// Returns label → value: channel codes for [`Imc::Channels`], the
    /// component name otherwise.
    pub fn compute(
        &self,
        imt: &Imt,
        stream: &Stream,
        damping: f64,
        rotation_step_deg: f64,
    ) -> Result<BTreeMap<String, f64>> {
        if !(damping > 0.0 && damping < 1.0) {
            return Err(GmError::ConfigValidationFailed(format!(
                "damping ratio {} must be within (0, 1)",
                damping
            )));
        }
        if !(rotation_step_deg > 0.0 && rotation_step_deg <= 90.0) {
            return Err(GmError::ConfigValidationFailed(format!(
                "rotation step {} must be within (0, 90] degrees",
                rotation_step_deg
            )));
        }
        let value = match *self {
            Imc::Channels => return channel_values(imt, stream, damping),
            Imc::GreaterOfTwoHorizontals => {
                let (acc1, acc2, dt) = horizontal_accelerations(stream, &self.name())?;
                imt.compute(&acc1, dt, damping)
                    .max(imt.compute(&acc2, dt, damping))
            }
            Imc::RotD(p) => {
                let (acc1, acc2, dt) = horizontal_accelerations(stream, &self.name())?;
                let (r1, r2) = paired_responses(imt, &acc1, &acc2, dt, damping);
                let angles = rotation_angles(180.0, rotation_step_deg);
                let rotated = rotate(&r1, &r2, &angles, 0.0);
                let reduced: Vec<f64> = rotated
                    .axis_iter(Axis(0))
                    .map(|row| imt.reduce(row, dt))
                    .collect();
                percentile(&reduced, p)
            }
            Imc::GmRotD(p) => {
                let (acc1, acc2, dt) = horizontal_accelerations(stream, &self.name())?;
                let (r1, r2) = paired_responses(imt, &acc1, &acc2, dt, damping);
                let angles = rotation_angles(90.0, rotation_step_deg);
                let first = rotate(&r1, &r2, &angles, 0.0);
                let second = rotate(&r1, &r2, &angles, 90.0);
                let gm: Vec<f64> = first
                    .axis_iter(Axis(0))
                    .zip(second.axis_iter(Axis(0)))
                    .map(|(a, b)| (imt.reduce(a, dt) * imt.reduce(b, dt)).sqrt())
                    .collect();
                percentile(&gm, p)
            }
        };

        Ok(BTreeMap::from([(self.name(), value)]))
    }
}

impl fmt::Display for Imc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imc::Channels => f.write_str("CHANNELS"),
            Imc::GreaterOfTwoHorizontals => f.write_str("GREATER_OF_TWO_HORIZONTALS"),
            Imc::RotD(p) => write!(f, "ROTD({:.1})", p),
            Imc::GmRotD(p) => write!(f, "GMROTD({:.1})", p),
        }
    }
}

fn channel_values(imt: &Imt, stream: &Stream, damping: f64) -> Result<BTreeMap<String, f64>> {
    let mut values = BTreeMap::new();
    for trace in stream {
        let acc = trace.acceleration_cgs()?;
        values.insert(
            trace.channel().to_string(),
            imt.compute(&acc, trace.delta(), damping),
        );
    }
    Ok(values)
}

/// The two non-vertical traces of a stream
fn two_horizontals<'a>(stream: &'a Stream, imc: &str) -> Result<(&'a Trace, &'a Trace)> {
    let horizontals = stream.horizontals();
    match horizontals.as_slice() {
        [h1, h2] => Ok((*h1, *h2)),
        other => Err(GmError::HorizontalChannelCount {
            imc: imc.to_string(),
            found: other.len(),
        }),
    }
}

/// Accelerations (cm/s/s) of the two horizontals and their shared sample interval
fn horizontal_accelerations(stream: &Stream, imc: &str) -> Result<(Vec<f64>, Vec<f64>, f64)> {
    let (h1, h2) = two_horizontals(stream, imc)?;
    if (h1.delta() - h2.delta()).abs() > 1e-9 * h1.delta() {
        return Err(GmError::InconsistentStream(format!(
            "{} and {} have different sample intervals",
            h1.id(),
            h2.id()
        )));
    }
    Ok((h1.acceleration_cgs()?, h2.acceleration_cgs()?, h1.delta()))
}

/// Larger peak absolute amplitude of exactly two horizontal channels, in the
/// traces' own units
pub fn greater_of_two_horizontals(stream: &Stream) -> Result<f64> {
    let (h1, h2) = two_horizontals(stream, "greater_of_two_horizontals")?;
    Ok(h1.max_abs().max(h2.max_abs()))
}

/// Responses of both horizontals, truncated to a common length
fn paired_responses(
    imt: &Imt,
    acc1: &[f64],
    acc2: &[f64],
    dt: f64,
    damping: f64,
) -> (Array1<f64>, Array1<f64>) {
    let n = acc1.len().min(acc2.len());
    let r1 = imt.response(&acc1[..n], dt, damping);
    let r2 = imt.response(&acc2[..n], dt, damping);
    (Array1::from(r1), Array1::from(r2))
}

/// Angles in degrees over `[0, span)`
fn rotation_angles(span: f64, step: f64) -> Array1<f64> {
    let count = ((span / step).round() as usize).max(1);
    Array1::from_iter((0..count).map(|k| k as f64 * span / count as f64))
}

/// Row k holds `r1 cos(θk + offset) + r2 sin(θk + offset)`
fn rotate(
    r1: &Array1<f64>,
    r2: &Array1<f64>,
    angles: &Array1<f64>,
    offset_deg: f64,
) -> Array2<f64> {
    let theta = angles.mapv(|a| (a + offset_deg).to_radians());
    let cos = theta.mapv(f64::cos).insert_axis(Axis(1));
    let sin = theta.mapv(f64::sin).insert_axis(Axis(1));
    let r1 = r1.view().insert_axis(Axis(0));
    let r2 = r2.view().insert_axis(Axis(0));
    &cos * &r1 + &sin * &r2
}
