//! Uniformly sampled single-channel time series and its metadata

use crate::error::{GmError, Result};
use crate::process::record::ProcessingRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute time used throughout the crate
pub type Timestamp = DateTime<Utc>;

/// Convert a (possibly fractional) number of seconds to a chrono duration,
/// rounded to the nearest nanosecond.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * 1e9).round() as i64)
}

/// Signed number of seconds from `from` to `to`
pub fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // Beyond ~292 years; millisecond precision is plenty there.
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Physical quantity recorded by a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Acceleration,
    Velocity,
    Displacement,
}

/// Physical units of the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[serde(rename = "cm/s/s")]
    CmPerS2,
    #[serde(rename = "m/s/s")]
    MPerS2,
    #[serde(rename = "cm/s")]
    CmPerS,
    #[serde(rename = "m/s")]
    MPerS,
    #[serde(rename = "cm")]
    Cm,
    #[serde(rename = "m")]
    M,
}

impl Units {
    pub fn quantity(&self) -> Quantity {
        match self {
            Units::CmPerS2 | Units::MPerS2 => Quantity::Acceleration,
            Units::CmPerS | Units::MPerS => Quantity::Velocity,
            Units::Cm | Units::M => Quantity::Displacement,
        }
    }

    /// Multiplier that converts a value in these units to CGS (cm based) units
    pub fn to_cgs_factor(&self) -> f64 {
        match self {
            Units::CmPerS2 | Units::CmPerS | Units::Cm => 1.0,
            Units::MPerS2 | Units::MPerS | Units::M => 100.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::CmPerS2 => "cm/s/s",
            Units::MPerS2 => "m/s/s",
            Units::CmPerS => "cm/s",
            Units::MPerS => "m/s",
            Units::Cm => "cm",
            Units::M => "m",
        }
    }
}

/// Capability of anything that is time-indexed and tied to one channel
pub trait TimeSeries {
    /// Sample interval in seconds
    fn delta(&self) -> f64;
    fn starttime(&self) -> Timestamp;
    fn npts(&self) -> usize;
    fn channel(&self) -> &str;

    fn sampling_rate(&self) -> f64 {
        1.0 / self.delta()
    }

    /// Time of the last sample
    fn endtime(&self) -> Timestamp {
        let span = self.npts().saturating_sub(1) as f64 * self.delta();
        self.starttime() + seconds_to_duration(span)
    }

    /// Seconds between first and last sample
    fn duration(&self) -> f64 {
        self.npts().saturating_sub(1) as f64 * self.delta()
    }

    /// Vertical channels carry a `Z` in their channel code
    fn is_vertical(&self) -> bool {
        self.channel().to_ascii_uppercase().contains('Z')
    }
}

/// Trace header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStats {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub station: String,
    #[serde(default)]
    pub location: String,
    pub channel: String,
    /// Sample interval in seconds
    pub delta: f64,
    pub starttime: Timestamp,
    pub units: Units,
}

/// Serialized form of a [`Trace`], validated on the way in
#[derive(Deserialize)]
struct RawTrace {
    stats: TraceStats,
    data: Vec<f64>,
    #[serde(default)]
    processing: Option<ProcessingRecord>,
}

impl TryFrom<RawTrace> for Trace {
    type Error = GmError;

    fn try_from(raw: RawTrace) -> Result<Self> {
        let mut trace = Trace::new(raw.stats, raw.data)?;
        trace.processing = raw.processing;
        Ok(trace)
    }
}

/// A single channel of ground motion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTrace")]
pub struct Trace {
    pub stats: TraceStats,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processing: Option<ProcessingRecord>,
}

impl Trace {
    /// Create a trace, checking the sample interval and sample values
    pub fn new(stats: TraceStats, data: Vec<f64>) -> Result<Self> {
        if !(stats.delta.is_finite() && stats.delta > 0.0) {
            return Err(GmError::InvalidTrace(format!(
                "sample interval must be positive, got {}",
                stats.delta
            )));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(GmError::InvalidTrace(format!(
                "{} contains non-finite samples",
                stats.channel
            )));
        }
        Ok(Self {
            stats,
            data,
            processing: None,
        })
    }

    /// Same header, new samples; the processing record is not carried over
    pub fn with_data(&self, data: Vec<f64>) -> Self {
        Self {
            stats: self.stats.clone(),
            data,
            processing: None,
        }
    }

    /// SEED-style identifier `NET.STA.LOC.CHA`
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.stats.network, self.stats.station, self.stats.location, self.stats.channel
        )
    }

    /// Largest absolute sample value
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()))
    }

    /// Time of sample `idx`
    pub fn time_of(&self, idx: usize) -> Timestamp {
        self.stats.starttime + seconds_to_duration(idx as f64 * self.stats.delta)
    }

    /// Samples `first..=last` as a new trace; the start time moves with `first`
    pub fn slice(&self, first: usize, last: usize) -> Self {
        let last = last.min(self.data.len().saturating_sub(1));
        let first = first.min(last);
        let mut stats = self.stats.clone();
        stats.starttime = self.time_of(first);
        Self {
            stats,
            data: self.data.get(first..=last).map(<[f64]>::to_vec).unwrap_or_default(),
            processing: self.processing.clone(),
        }
    }

    /// Seconds from the first sample to `t` (negative before the trace)
    pub fn offset_of(&self, t: Timestamp) -> f64 {
        seconds_between(self.stats.starttime, t)
    }

    pub fn processing(&self) -> Option<&ProcessingRecord> {
        self.processing.as_ref()
    }

    /// True unless a processing record marks the trace as failed
    pub fn passed(&self) -> bool {
        self.processing.as_ref().map_or(true, |p| p.passed)
    }

    /// Attach the processing record; a trace can only be processed once
    pub(crate) fn attach_processing(&mut self, record: ProcessingRecord) -> Result<()> {
        if self.processing.is_some() {
            return Err(GmError::AlreadyProcessed(self.id()));
        }
        self.processing = Some(record);
        Ok(())
    }

    /// Samples expressed as acceleration in cm/s/s
    pub fn acceleration_cgs(&self) -> Result<Vec<f64>> {
        if self.stats.units.quantity() != Quantity::Acceleration {
            return Err(GmError::UnitsMismatch(format!(
                "{} is in {}, acceleration expected",
                self.id(),
                self.stats.units.as_str()
            )));
        }
        let factor = self.stats.units.to_cgs_factor();
        Ok(self.data.iter().map(|&x| x * factor).collect())
    }
}

impl TimeSeries for Trace {
    fn delta(&self) -> f64 {
        self.stats.delta
    }

    fn starttime(&self) -> Timestamp {
        self.stats.starttime
    }

    fn npts(&self) -> usize {
        self.data.len()
    }

    fn channel(&self) -> &str {
        &self.stats.channel
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} - {} | {:.1} Hz, {} samples",
            self.id(),
            self.starttime().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.endtime().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.sampling_rate(),
            self.npts()
        )?;
        if let Some(record) = &self.processing {
            match record.failure {
                Some(reason) => write!(f, " (failed: {})", reason)?,
                None => write!(f, " (passed)")?,
            }
        }
        Ok(())
    }
}
