//! P-wave arrival picking

use crate::config::PickerConfig;
use crate::process::filter::{butterworth, FilterKind};
use crate::process::sta_lta::classic_sta_lta;
use crate::signal::mean;
use crate::trace::{TimeSeries, Timestamp, Trace};
use tracing::debug;

const PICKER_FILTER_ORDER: usize = 4;

/// Pick the first P arrival with a band-limited STA/LTA trigger.
///
/// The trace is demeaned and causally band-passed over `config.band` so the
/// trigger is not pulled ahead of the arrival. Returns the time of the first
/// sample whose ratio reaches the threshold, or `None` if none does.
pub fn pick_p_arrival(trace: &Trace, config: &PickerConfig) -> Option<Timestamp> {
    let sr = trace.sampling_rate();
    let nsta = (config.sta_window * sr).round() as usize;
    let nlta = (config.lta_window * sr).round() as usize;
    if trace.npts() < nlta.max(1) {
        return None;
    }

    let offset = mean(&trace.data);
    let mut data: Vec<f64> = trace.data.iter().map(|x| x - offset).collect();
    let [low, high] = config.band;
    if !butterworth(&mut data, FilterKind::Highpass, low, sr, PICKER_FILTER_ORDER, false) {
        debug!("{}: picker high-pass at {} Hz skipped", trace.id(), low);
    }
    if !butterworth(&mut data, FilterKind::Lowpass, high, sr, PICKER_FILTER_ORDER, false) {
        debug!("{}: picker low-pass at {} Hz skipped", trace.id(), high);
    }

    let ratio = classic_sta_lta(&data, nsta, nlta);
    let idx = ratio.iter().position(|&r| r >= config.threshold)?;
    let pick = trace.time_of(idx);
    debug!("{}: P pick at {}", trace.id(), pick);
    Some(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{seconds_between, TraceStats, Units};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn trace_with_onset(onset_s: f64) -> Trace {
        let delta = 0.01;
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<f64> = (0..6000)
            .map(|i| {
                let t = i as f64 * delta;
                let noise = rng.gen_range(-0.01..0.01);
                if t >= onset_s {
                    noise + 5.0 * (2.0 * std::f64::consts::PI * 3.0 * (t - onset_s)).sin()
                } else {
                    noise
                }
            })
            .collect();
        let stats = TraceStats {
            network: "CI".to_string(),
            station: "PASC".to_string(),
            location: "00".to_string(),
            channel: "HNZ".to_string(),
            delta,
            starttime: Utc.with_ymd_and_hms(2019, 7, 6, 3, 19, 53).unwrap(),
            units: Units::CmPerS2,
        };
        Trace::new(stats, data).unwrap()
    }

    #[test]
    fn test_pick_near_onset() {
        let tr = trace_with_onset(30.0);
        let config = PickerConfig {
            sta_window: 1.0,
            ..PickerConfig::default()
        };
        let pick = pick_p_arrival(&tr, &config).unwrap();
        let offset = seconds_between(tr.starttime(), pick);
        assert!((offset - 30.0).abs() < 0.5, "pick at {offset}");
    }

    #[test]
    fn test_no_pick_below_band() {
        // Steady 0.2 Hz motion is removed by the band-pass and never triggers
        let tr = trace_with_onset(0.0);
        let slow: Vec<f64> = (0..tr.npts())
            .map(|i| (2.0 * std::f64::consts::PI * 0.2 * i as f64 * tr.delta()).sin())
            .collect();
        let tr = tr.with_data(slow);
        assert!(pick_p_arrival(&tr, &PickerConfig::default()).is_none());
    }

    #[test]
    fn test_short_trace_has_no_pick() {
        let tr = trace_with_onset(1.0);
        let short = tr.slice(0, 500);
        assert!(pick_p_arrival(&short, &PickerConfig::default()).is_none());
    }
}
