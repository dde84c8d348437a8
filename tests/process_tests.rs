//! Validation tests for the record processing pipeline

use chrono::{TimeZone, Utc};
use groundmotion::config::Config;
use groundmotion::process::amplitude::check_max_amplitude;
use groundmotion::process::corners::{get_corner_frequencies, CornerParams};
use groundmotion::process::filter::{butterworth, FilterKind};
use groundmotion::process::split::{split_signal_and_noise, SplitMethod, SplitOutcome};
use groundmotion::process::sta_lta::check_sta_lta;
use groundmotion::process::window::trim_total_window;
use groundmotion::process::{process_stream, process_streams, process_trace};
use groundmotion::trace::seconds_to_duration;
use groundmotion::{
    CornerFrequencies, EventInfo, FailureReason, GmError, ProcessingStage, Stream, TimeSeries,
    Trace, TraceStats, Units,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const DELTA: f64 = 0.02;
const NPTS: usize = 10_001;
/// Sample where the synthetic arrival starts (40 s)
const ONSET: usize = 2000;

fn make_trace(channel: &str, data: Vec<f64>) -> Trace {
    let stats = TraceStats {
        network: "CI".to_string(),
        station: "CCC".to_string(),
        location: String::new(),
        channel: channel.to_string(),
        delta: DELTA,
        starttime: Utc.with_ymd_and_hms(2019, 7, 6, 3, 19, 0).unwrap(),
        units: Units::CmPerS2,
    };
    Trace::new(stats, data).unwrap()
}

/// Quiet white noise followed by strong white noise from `ONSET`
fn generate_record(seed: u64, noise_amp: f64, signal_amp: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..NPTS)
        .map(|i| {
            let amp = if i < ONSET { noise_amp } else { signal_amp };
            rng.gen_range(-amp..amp)
        })
        .collect()
}

/// Signal band-limited below ~5 Hz plus an isolated 18 Hz line
fn generate_band_limited_record(seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut noise: Vec<f64> = (0..ONSET).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut signal: Vec<f64> = (ONSET..NPTS).map(|_| rng.gen_range(-30.0..30.0)).collect();
    assert!(butterworth(&mut signal, FilterKind::Lowpass, 5.0, 1.0 / DELTA, 8, true));
    for (i, x) in signal.iter_mut().enumerate() {
        *x += 10.0 * (2.0 * PI * 18.0 * i as f64 * DELTA).sin();
    }
    noise.extend(signal);
    noise
}

/// Event whose velocity-based split falls on `ONSET`: origin at 20 s, 140 km at 7 km/s
fn make_event(trace: &Trace) -> EventInfo {
    EventInfo::new(trace.starttime() + seconds_to_duration(20.0), 140.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_boundaries_pass() {
        let tr = make_trace("HN1", vec![0.0, 2.0, -4.0, 1.0]);
        assert!(check_max_amplitude(&tr, 4.0, 10.0));
        assert!(check_max_amplitude(&tr, 1.0, 4.0));
        assert!(!check_max_amplitude(&tr, 4.000001, 10.0));
        assert!(!check_max_amplitude(&tr, 1.0, 3.999999));
    }

    #[test]
    fn test_trim_preserves_end_time() {
        let tr = make_trace("HN1", vec![1.0; NPTS]);
        let end = tr.endtime();

        // Window end beyond the trace
        let start = tr.starttime() + seconds_to_duration(30.0);
        let trimmed = trim_total_window(&tr, start, 500.0).unwrap();
        assert_eq!(trimmed.endtime(), end);

        // Window end exactly on the trace end
        let start = tr.starttime() + seconds_to_duration(50.0);
        let trimmed = trim_total_window(&tr, start, 150.0).unwrap();
        assert_eq!(trimmed.endtime(), end);
        assert_eq!(trimmed.starttime(), start);
    }

    #[test]
    fn test_split_usage_errors_and_outside_trace() {
        let tr = make_trace("HN1", vec![1.0; NPTS]);

        let no_pick = make_event(&tr);
        assert!(matches!(
            split_signal_and_noise(&tr, &no_pick, SplitMethod::PArrival, 7.0),
            Err(GmError::MissingEventMetadata(_))
        ));
        assert!(matches!(
            split_signal_and_noise(&tr, &EventInfo::default(), SplitMethod::Velocity, 7.0),
            Err(GmError::MissingEventMetadata(_))
        ));
        assert!(matches!(
            "pwave".parse::<SplitMethod>(),
            Err(GmError::UnknownSplitMethod(_))
        ));

        // Start time advanced past the theoretical arrival
        let early = EventInfo::new(tr.starttime() - seconds_to_duration(60.0), 70.0);
        assert_eq!(
            split_signal_and_noise(&tr, &early, SplitMethod::Velocity, 7.0).unwrap(),
            SplitOutcome::OutsideTrace
        );
    }

    #[test]
    fn test_corner_frequencies_found() {
        let tr = make_trace("HN1", generate_record(11, 0.01, 100.0));
        let corners =
            get_corner_frequencies(&tr, &make_event(&tr), &CornerParams::default()).unwrap();
        match corners {
            CornerFrequencies::Found { low, high } => {
                assert!(low < high);
                assert!(low >= 1.0 / tr.duration());
                assert!(low < 0.01, "low = {}", low);
                assert!((high - 25.0).abs() < 1e-9, "high = {}", high);
            }
            other => panic!("expected corners, got {:?}", other),
        }
    }

    #[test]
    fn test_corner_frequencies_sentinels() {
        let tr = make_trace("HN1", generate_record(12, 0.01, 100.0));

        let strict = CornerParams {
            ratio: 1e7,
            ..CornerParams::default()
        };
        let corners = get_corner_frequencies(&tr, &make_event(&tr), &strict).unwrap();
        assert_eq!(corners, CornerFrequencies::InsufficientSnr);
        assert_eq!(corners.as_pair(), [-2.0, -2.0]);

        let late_start = EventInfo::new(tr.starttime() - seconds_to_duration(100.0), 70.0);
        let corners = get_corner_frequencies(&tr, &late_start, &CornerParams::default()).unwrap();
        assert_eq!(corners, CornerFrequencies::NoSplit);
        assert_eq!(corners.as_pair(), [-1.0, -1.0]);
    }

    #[test]
    fn test_reference_band_below_resolution_is_insufficient() {
        let tr = make_trace("HN1", generate_record(12, 0.01, 100.0));
        // Below both 1 / duration and the first FFT bin
        let params = CornerParams {
            reference_band: [0.001, 0.002],
            ..CornerParams::default()
        };
        let corners = get_corner_frequencies(&tr, &make_event(&tr), &params).unwrap();
        assert_eq!(corners, CornerFrequencies::InsufficientSnr);
        assert_eq!(corners.as_pair(), [-2.0, -2.0]);
    }

    #[test]
    fn test_corner_search_keeps_band_around_reference() {
        let tr = make_trace("HN1", generate_band_limited_record(13));
        let corners =
            get_corner_frequencies(&tr, &make_event(&tr), &CornerParams::default()).unwrap();
        match corners {
            CornerFrequencies::Found { low, high } => {
                assert!(low < 0.1);
                // The 18 Hz line passes too but is separated from the reference band
                assert!(high > 5.0 && high < 8.0, "high = {}", high);
            }
            other => panic!("expected corners, got {:?}", other),
        }
    }

    #[test]
    fn test_sta_lta_detects_onset() {
        let tr = make_trace("HN1", generate_record(14, 0.01, 100.0));
        assert!(check_sta_lta(&tr, 1.0, 20.0, 3.0));

        let flat = make_trace("HN2", generate_record(15, 1.0, 1.0));
        assert!(!check_sta_lta(&flat, 1.0, 20.0, 3.0));

        let short = make_trace("HN3", vec![1.0; 500]);
        assert!(!check_sta_lta(&short, 1.0, 20.0, 0.5));
    }

    #[test]
    fn test_pipeline_passes_good_record() {
        let tr = make_trace("HN1", generate_record(21, 0.01, 100.0));
        let event = make_event(&tr);
        let out = process_trace(tr, &event, &Config::default()).unwrap();
        let record = out.processing().unwrap();

        assert!(out.passed());
        assert_eq!(record.failure, None);
        assert_eq!(record.stage_reached, ProcessingStage::Windowed);
        assert!(record.baseline_applied);
        assert!(record.corners.unwrap().is_found());
        assert_eq!(record.default_corners, [0.1, 20.0]);

        let filter = record.filter.unwrap();
        assert!(filter.highpass_hz > 0.0);
        // High corner sits at Nyquist, so no low-pass
        assert_eq!(filter.lowpass_hz, None);

        // Window: origin + max(120 s, 140 km / 1 km/s)
        let origin = event.origin_time.unwrap();
        assert_eq!(out.starttime(), origin);
        assert_eq!(out.npts(), 7001);
        assert_eq!(record.window.unwrap().end, out.endtime());
    }

    #[test]
    fn test_pipeline_fixed_corners() {
        let tr = make_trace("HN1", generate_record(22, 0.01, 100.0));
        let event = make_event(&tr);
        let mut config = Config::default();
        config.corners.dynamic = false;
        config.window.enabled = false;

        let out = process_trace(tr, &event, &config).unwrap();
        let record = out.processing().unwrap();
        assert!(out.passed());
        assert_eq!(record.corners, Some(CornerFrequencies::Found { low: 0.1, high: 20.0 }));
        assert_eq!(record.filter.unwrap().lowpass_hz, Some(20.0));
        assert_eq!(record.stage_reached, ProcessingStage::Filtered);
        assert_eq!(out.npts(), NPTS);
    }

    #[test]
    fn test_pipeline_failure_reasons() {
        let event_for = |tr: &Trace| make_event(tr);

        // No impulsive arrival
        let flat = make_trace("HN1", generate_record(31, 1.0, 1.0));
        let original = flat.data.clone();
        let event = event_for(&flat);
        let out = process_trace(flat, &event, &Config::default()).unwrap();
        assert_eq!(out.processing().unwrap().failure, Some(FailureReason::StaLta));
        assert_eq!(out.data, original);

        // Split before the trace starts
        let tr = make_trace("HN1", generate_record(32, 0.01, 100.0));
        let early = EventInfo::new(tr.starttime() - seconds_to_duration(100.0), 70.0);
        let out = process_trace(tr, &early, &Config::default()).unwrap();
        let record = out.processing().unwrap();
        assert_eq!(record.failure, Some(FailureReason::CornerFrequencySignalSplit));
        assert_eq!(record.stage_reached, ProcessingStage::StaLtaChecked);

        // Unreachable SNR
        let tr = make_trace("HN1", generate_record(33, 0.01, 100.0));
        let event = event_for(&tr);
        let mut config = Config::default();
        config.corners.snr_ratio = 1e7;
        let out = process_trace(tr, &event, &config).unwrap();
        let record = out.processing().unwrap();
        assert_eq!(record.failure, Some(FailureReason::CornerFrequencySearch));
        assert_eq!(record.corners, Some(CornerFrequencies::InsufficientSnr));

        // Fixed corners in the wrong order
        let tr = make_trace("HN1", generate_record(34, 0.01, 100.0));
        let event = event_for(&tr);
        let mut config = Config::default();
        config.corners.dynamic = false;
        config.corners.default_low_frequency = 5.0;
        config.corners.default_high_frequency = 2.0;
        let out = process_trace(tr, &event, &config).unwrap();
        assert_eq!(out.processing().unwrap().failure, Some(FailureReason::LowPassInvalid));
    }

    #[test]
    fn test_p_arrival_split_uses_picker() {
        let tr = make_trace("HN1", generate_record(41, 0.01, 100.0));
        let event = make_event(&tr);
        let mut config = Config::default();
        config.split.method = SplitMethod::PArrival;
        config.picker.sta_window = 1.0;

        let out = process_trace(tr.clone(), &event, &config).unwrap();
        let record = out.processing().unwrap();
        assert!(out.passed());
        let split = record.split.unwrap();
        let onset = tr.time_of(ONSET);
        assert!((split.signal_start - onset).num_milliseconds().abs() < 500);

        config.picker.enabled = false;
        assert!(matches!(
            process_trace(tr, &event, &config),
            Err(GmError::MissingEventMetadata(_))
        ));
    }

    #[test]
    fn test_stream_verdict_is_and_of_traces() {
        let traces = vec![
            make_trace("HN1", generate_record(51, 0.01, 100.0)),
            make_trace("HN2", generate_record(52, 0.01, 100.0)),
            make_trace("HNZ", vec![0.0; NPTS]),
        ];
        let event = make_event(&traces[0]);
        let stream = Stream::new(traces).unwrap();

        let processed = process_stream(stream, &event, &Config::default()).unwrap();
        assert!(!processed.passed());
        let verdicts: Vec<bool> = processed.iter().map(Trace::passed).collect();
        assert_eq!(verdicts, vec![true, true, false]);
        assert!(processed.to_string().contains("(failed)"));
    }

    #[test]
    fn test_parallel_streams() {
        let mut batch = Vec::new();
        for (i, station) in ["AAA", "BBB", "CCC"].iter().enumerate() {
            let mut tr = make_trace("HN1", generate_record(60 + i as u64, 0.01, 100.0));
            tr.stats.station = station.to_string();
            let event = make_event(&tr);
            batch.push((Stream::new(vec![tr]).unwrap(), event));
        }

        let results = process_streams(batch, &Config::default());
        assert_eq!(results.len(), 3);
        for result in results {
            assert!(result.unwrap().passed());
        }
    }
}
