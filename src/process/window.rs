//! Trimming a trace to a processing window

use crate::error::{GmError, Result};
use crate::trace::{TimeSeries, Timestamp, Trace};

/// Sample-grid tolerance, in samples
const GRID_TOLERANCE: f64 = 1e-6;

/// Restrict `trace` to `[start, start + duration]`.
///
/// Samples are only removed: a window that starts before the trace keeps the
/// original start, one that ends after it keeps the original end. The first kept
/// sample is the first at or after `start`, the last the last at or before the
/// window end. A window lying wholly before or after the trace is an error.
pub fn trim_total_window(trace: &Trace, start: Timestamp, duration: f64) -> Result<Trace> {
    if trace.npts() == 0 {
        return Err(GmError::InvalidTrace(format!("{} has no samples", trace.id())));
    }
    if start > trace.endtime() {
        return Err(GmError::WindowStartAfterEnd {
            start: start.to_rfc3339(),
            end: trace.endtime().to_rfc3339(),
        });
    }

    let dt = trace.delta();
    let last_idx = trace.npts() - 1;

    let start_pos = trace.offset_of(start) / dt;
    let first = if start_pos <= 0.0 {
        0
    } else {
        ((start_pos - GRID_TOLERANCE).ceil() as usize).min(last_idx)
    };

    let end_pos = start_pos + duration.max(0.0) / dt;
    if end_pos < -GRID_TOLERANCE {
        return Err(GmError::InvalidTrace(format!(
            "{}: window ends before the first sample at {}",
            trace.id(),
            trace.starttime().to_rfc3339()
        )));
    }
    let last = if end_pos >= last_idx as f64 {
        last_idx
    } else {
        ((end_pos + GRID_TOLERANCE).floor().max(0.0) as usize).max(first)
    };

    Ok(trace.slice(first, last))
}
