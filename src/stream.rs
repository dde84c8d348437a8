//! Group of traces recorded by one instrument at one station

use crate::error::{GmError, Result};
use crate::trace::{TimeSeries, Trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Traces sharing network, station and instrument type (first two channel characters)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Trace>", into = "Vec<Trace>")]
pub struct Stream {
    traces: Vec<Trace>,
}

/// `NET.STA.XX` key used to group traces into streams
fn group_id(trace: &Trace) -> String {
    let instrument: String = trace.stats.channel.chars().take(2).collect();
    format!("{}.{}.{}", trace.stats.network, trace.stats.station, instrument)
}

impl Stream {
    /// Build a stream, rejecting mixed instruments and duplicated channel codes
    pub fn new(traces: Vec<Trace>) -> Result<Self> {
        let Some(first) = traces.first() else {
            return Err(GmError::InconsistentStream(
                "a stream needs at least one trace".to_string(),
            ));
        };
        let id = group_id(first);

        let mut channels = HashSet::new();
        for trace in &traces {
            let other = group_id(trace);
            if other != id {
                return Err(GmError::InconsistentStream(format!(
                    "trace {} does not belong to {}",
                    other, id
                )));
            }
            if !channels.insert(trace.stats.channel.clone()) {
                return Err(GmError::InconsistentStream(format!(
                    "channel {} appears twice in {}",
                    trace.stats.channel, id
                )));
            }
        }

        Ok(Self { traces })
    }

    /// Stream identifier `NET.STA.XX`
    pub fn id(&self) -> String {
        self.traces.first().map(group_id).unwrap_or_default()
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn into_traces(self) -> Vec<Trace> {
        self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }

    /// Non-vertical traces, in stream order
    pub fn horizontals(&self) -> Vec<&Trace> {
        self.traces.iter().filter(|t| !t.is_vertical()).collect()
    }

    /// A stream passes only if every one of its traces passed
    pub fn passed(&self) -> bool {
        self.traces.iter().all(Trace::passed)
    }
}

impl TryFrom<Vec<Trace>> for Stream {
    type Error = GmError;

    fn try_from(traces: Vec<Trace>) -> Result<Self> {
        Stream::new(traces)
    }
}

impl From<Stream> for Vec<Trace> {
    fn from(stream: Stream) -> Self {
        stream.traces
    }
}

impl<'a> IntoIterator for &'a Stream {
    type Item = &'a Trace;
    type IntoIter = std::slice::Iter<'a, Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.iter()
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "passed" } else { "failed" };
        writeln!(f, "{} trace(s) in stream {} ({}):", self.len(), self.id(), status)?;
        for trace in &self.traces {
            writeln!(f, "  {}", trace)?;
        }
        Ok(())
    }
}
