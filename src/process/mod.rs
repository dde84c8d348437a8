//! Record processing: quality gates, corner selection, conditioning and the
//! per-trace verdict.
//!
//! The orchestrator runs the stages in order:
//!
//! `Raw → AmplitudeChecked → StaLtaChecked → FrequencySelected → Filtered →
//! (baseline) → Windowed`
//!
//! then the verdict is written. A failing gate jumps straight to the verdict,
//! and `stage_reached` keeps the last stage completed. Failed traces are returned
//! with their original samples and a record saying why they failed.

pub mod amplitude;
pub mod baseline;
pub mod corners;
pub mod filter;
pub mod record;
pub mod split;
pub mod sta_lta;
pub mod window;

use crate::config::Config;
use crate::error::{GmError, Result};
use crate::event::EventInfo;
use crate::phase::pick_p_arrival;
use crate::stream::Stream;
use crate::trace::{TimeSeries, Trace};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use amplitude::check_max_amplitude;
use baseline::correct_baseline;
use corners::{get_corner_frequencies, CornerFrequencies, CornerParams};
use filter::{butterworth, cosine_taper, detrend, FilterKind};
use record::{AppliedFilter, FailureReason, ProcessingRecord, ProcessingStage, WindowBounds};
use split::{split_signal_and_noise, SplitMethod, SplitOutcome};
use sta_lta::max_sta_lta;
use window::trim_total_window;

/// Run every stage on `trace` and attach the resulting record.
///
/// Usage errors (missing event metadata for the configured split method, a
/// trace that already carries a record) are returned as `Err`. Data-quality
/// failures produce `Ok` with a failed verdict.
pub fn process_trace(trace: Trace, event: &EventInfo, config: &Config) -> Result<Trace> {
    if trace.processing().is_some() {
        return Err(GmError::AlreadyProcessed(trace.id()));
    }

    let mut record = ProcessingRecord::new([
        config.corners.default_low_frequency,
        config.corners.default_high_frequency,
    ]);
    let mut working = trace.clone();
    let failure = run_stages(&mut working, event, config, &mut record)?;

    let mut output = match failure {
        None => {
            record.passed = true;
            info!("{}: passed ({:?})", working.id(), record.stage_reached);
            working
        }
        Some(reason) => {
            record.failure = Some(reason);
            warn!("{}: failed at {:?} ({})", trace.id(), record.stage_reached, reason);
            trace
        }
    };
    output.attach_processing(record)?;
    Ok(output)
}

/// Stages in order; `Ok(Some(reason))` stops at the first failing gate
fn run_stages(
    trace: &mut Trace,
    event: &EventInfo,
    config: &Config,
    record: &mut ProcessingRecord,
) -> Result<Option<FailureReason>> {
    let id = trace.id();

    // Amplitude gate
    record.peak_amplitude = trace.max_abs() * trace.stats.units.to_cgs_factor();
    if !check_max_amplitude(trace, config.amplitude.min_amp, config.amplitude.max_amp) {
        return Ok(Some(FailureReason::Amplitude));
    }
    record.stage_reached = ProcessingStage::AmplitudeChecked;

    // Event detection
    let sta_lta = &config.sta_lta;
    record.max_sta_lta = max_sta_lta(trace, sta_lta.sta_window, sta_lta.lta_window);
    if !record.max_sta_lta.is_some_and(|r| r > sta_lta.threshold) {
        return Ok(Some(FailureReason::StaLta));
    }
    record.stage_reached = ProcessingStage::StaLtaChecked;

    // Fill in a P pick when the split needs one and none was supplied
    let mut event = event.clone();
    if config.split.method == SplitMethod::PArrival
        && event.p_arrival.is_none()
        && config.picker.enabled
    {
        event.p_arrival = pick_p_arrival(trace, &config.picker);
        debug!("{}: picker returned {:?}", id, event.p_arrival);
    }

    // Signal/noise split
    match split_signal_and_noise(trace, &event, config.split.method, config.split.p_velocity)? {
        SplitOutcome::Split(window) => record.split = Some(window),
        SplitOutcome::OutsideTrace => return Ok(Some(FailureReason::CornerFrequencySignalSplit)),
    }

    // Corner frequencies
    let corners = if config.corners.dynamic {
        get_corner_frequencies(trace, &event, &CornerParams::from_config(config))?
    } else {
        CornerFrequencies::Found {
            low: config.corners.default_low_frequency,
            high: config.corners.default_high_frequency,
        }
    };
    record.corners = Some(corners);
    let (low, high) = match corners {
        CornerFrequencies::Found { low, high } => (low, high),
        CornerFrequencies::NoSplit => return Ok(Some(FailureReason::CornerFrequencySignalSplit)),
        CornerFrequencies::InsufficientSnr => return Ok(Some(FailureReason::CornerFrequencySearch)),
    };
    record.stage_reached = ProcessingStage::FrequencySelected;
    info!("{}: corners {:.4} - {:.4} Hz", id, low, high);

    // Conditioning
    if !(high > 0.0 && high > low) {
        return Ok(Some(FailureReason::LowPassInvalid));
    }
    let sr = trace.sampling_rate();
    let filter_cfg = &config.filter;
    if filter_cfg.detrend {
        detrend(&mut trace.data);
    }
    cosine_taper(&mut trace.data, filter_cfg.taper_fraction);
    if !butterworth(
        &mut trace.data,
        FilterKind::Highpass,
        low,
        sr,
        filter_cfg.order,
        filter_cfg.zero_phase,
    ) {
        return Ok(Some(FailureReason::LowPassInvalid));
    }
    let lowpass_hz = if butterworth(
        &mut trace.data,
        FilterKind::Lowpass,
        high,
        sr,
        filter_cfg.order,
        filter_cfg.zero_phase,
    ) {
        Some(high)
    } else {
        warn!("{}: low-pass corner {:.3} Hz at or above Nyquist, skipped", id, high);
        None
    };
    record.filter = Some(AppliedFilter {
        highpass_hz: low,
        lowpass_hz,
        order: filter_cfg.order,
        zero_phase: filter_cfg.zero_phase,
    });
    record.stage_reached = ProcessingStage::Filtered;

    // Baseline
    if config.baseline.enabled {
        let dt = trace.delta();
        if let Err(e) = correct_baseline(&mut trace.data, dt) {
            warn!("{}: baseline correction failed: {}", id, e);
            return Ok(Some(FailureReason::BaselineCorrection));
        }
        record.baseline_applied = true;
    }

    // Processing window
    if config.window.enabled {
        let origin = event.origin_time.ok_or_else(|| {
            GmError::MissingEventMetadata("windowing needs the event origin time".to_string())
        })?;
        let distance = event.epicentral_distance_km.ok_or_else(|| {
            GmError::MissingEventMetadata("windowing needs the epicentral distance".to_string())
        })?;
        let duration = config.window.min_duration.max(distance / config.window.vmin);
        let trimmed = trim_total_window(trace, origin, duration)?;
        record.window = Some(WindowBounds {
            start: trimmed.starttime(),
            end: trimmed.endtime(),
        });
        *trace = trimmed;
        record.stage_reached = ProcessingStage::Windowed;
    }

    Ok(None)
}

/// Process every trace of a station; the stream verdict is the AND of its traces
pub fn process_stream(stream: Stream, event: &EventInfo, config: &Config) -> Result<Stream> {
    let traces = stream
        .into_traces()
        .into_iter()
        .map(|trace| process_trace(trace, event, config))
        .collect::<Result<Vec<_>>>()?;
    let processed = Stream::new(traces)?;
    info!("{}", processed);
    Ok(processed)
}

/// Process independent stations in parallel
pub fn process_streams(streams: Vec<(Stream, EventInfo)>, config: &Config) -> Vec<Result<Stream>> {
    streams
        .into_par_iter()
        .map(|(stream, event)| process_stream(stream, &event, config))
        .collect()
}
