//! Per-trace processing record (the verdict and every parameter behind it)

use crate::process::corners::CornerFrequencies;
use crate::process::split::SplitWindow;
use crate::trace::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a trace failed processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Amplitude,
    StaLta,
    CornerFrequencySignalSplit,
    CornerFrequencySearch,
    LowPassInvalid,
    BaselineCorrection,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Amplitude => "amplitude",
            FailureReason::StaLta => "sta_lta",
            FailureReason::CornerFrequencySignalSplit => "corner_frequency_signal_split",
            FailureReason::CornerFrequencySearch => "corner_frequency_search",
            FailureReason::LowPassInvalid => "low_pass_invalid",
            FailureReason::BaselineCorrection => "baseline_correction",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages, in order. The verdict itself lives in
/// [`ProcessingRecord::passed`] and [`ProcessingRecord::failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Raw,
    AmplitudeChecked,
    StaLtaChecked,
    FrequencySelected,
    Filtered,
    Windowed,
}

/// Filter corners actually applied to the samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilter {
    pub highpass_hz: f64,
    /// `None` when the low-pass corner sat at or above Nyquist and was skipped
    pub lowpass_hz: Option<f64>,
    pub order: usize,
    pub zero_phase: bool,
}

/// Time span kept by the windowing stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Everything the orchestrator decided about one trace.
///
/// Attached once, when the pipeline finishes; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub passed: bool,
    pub failure: Option<FailureReason>,
    /// Last stage completed before the verdict was set
    pub stage_reached: ProcessingStage,
    pub peak_amplitude: f64,
    pub max_sta_lta: Option<f64>,
    pub split: Option<SplitWindow>,
    pub corners: Option<CornerFrequencies>,
    /// Configured `[default_low, default_high]` bounds, recorded next to the selection
    pub default_corners: [f64; 2],
    pub filter: Option<AppliedFilter>,
    pub baseline_applied: bool,
    pub window: Option<WindowBounds>,
}

impl ProcessingRecord {
    pub(crate) fn new(default_corners: [f64; 2]) -> Self {
        Self {
            passed: false,
            failure: None,
            stage_reached: ProcessingStage::Raw,
            peak_amplitude: 0.0,
            max_sta_lta: None,
            split: None,
            corners: None,
            default_corners,
            filter: None,
            baseline_applied: false,
            window: None,
        }
    }
}
