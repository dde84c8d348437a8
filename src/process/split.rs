//! Signal/noise split: where the pre-event noise ends and the signal begins

use crate::error::{GmError, Result};
use crate::event::EventInfo;
use crate::trace::{seconds_to_duration, TimeSeries, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy used to place the split point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Use the picked P arrival carried on the event metadata
    PArrival,
    /// Origin time plus epicentral distance over an assumed P velocity
    Velocity,
}

impl FromStr for SplitMethod {
    type Err = GmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p_arrival" => Ok(SplitMethod::PArrival),
            "velocity" => Ok(SplitMethod::Velocity),
            _ => Err(GmError::UnknownSplitMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMethod::PArrival => f.write_str("p_arrival"),
            SplitMethod::Velocity => f.write_str("velocity"),
        }
    }
}

/// Noise ends where the signal starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitWindow {
    pub noise_end: Timestamp,
    pub signal_start: Timestamp,
}

/// Result of a split attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitOutcome {
    Split(SplitWindow),
    /// The split point falls outside the trace (data condition, not an error)
    OutsideTrace,
}

/// Estimate the split time for `method` from the event metadata
pub fn split_time(event: &EventInfo, method: SplitMethod, p_velocity: f64) -> Result<Timestamp> {
    match method {
        SplitMethod::PArrival => event.p_arrival.ok_or_else(|| {
            GmError::MissingEventMetadata("p_arrival split needs a P-wave arrival pick".to_string())
        }),
        SplitMethod::Velocity => {
            let origin = event.origin_time.ok_or_else(|| {
                GmError::MissingEventMetadata(
                    "velocity split needs the event origin time".to_string(),
                )
            })?;
            let distance = event.epicentral_distance_km.ok_or_else(|| {
                GmError::MissingEventMetadata(
                    "velocity split needs the epicentral distance".to_string(),
                )
            })?;
            Ok(origin + seconds_to_duration(distance / p_velocity))
        }
    }
}

/// Split a trace into noise and signal segments.
///
/// Missing metadata is a usage error. A split point on or outside the trace's
/// first/last sample yields [`SplitOutcome::OutsideTrace`], since one of the two
/// segments would be empty.
pub fn split_signal_and_noise<T: TimeSeries>(
    trace: &T,
    event: &EventInfo,
    method: SplitMethod,
    p_velocity: f64,
) -> Result<SplitOutcome> {
    let split = split_time(event, method, p_velocity)?;

    if split <= trace.starttime() || split >= trace.endtime() {
        tracing::debug!(
            "split time {} lies outside {} - {}",
            split,
            trace.starttime(),
            trace.endtime()
        );
        return Ok(SplitOutcome::OutsideTrace);
    }

    Ok(SplitOutcome::Split(SplitWindow {
        noise_end: split,
        signal_start: split,
    }))
}
