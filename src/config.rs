//! Configuration system for the ground-motion processor

use crate::error::{GmError, Result};
use crate::process::split::SplitMethod;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub amplitude: AmplitudeConfig,
    pub sta_lta: StaLtaConfig,
    pub split: SplitConfig,
    pub corners: CornerConfig,
    pub filter: FilterConfig,
    pub baseline: BaselineConfig,
    pub window: WindowConfig,
    pub picker: PickerConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            amplitude: AmplitudeConfig::default(),
            sta_lta: StaLtaConfig::default(),
            split: SplitConfig::default(),
            corners: CornerConfig::default(),
            filter: FilterConfig::default(),
            baseline: BaselineConfig::default(),
            window: WindowConfig::default(),
            picker: PickerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Plausible peak amplitude range, in cm/s/s
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeConfig {
    pub min_amp: f64,
    pub max_amp: f64,
}

impl Default for AmplitudeConfig {
    fn default() -> Self {
        Self {
            min_amp: 10e-7,
            max_amp: 10e7,
        }
    }
}

/// STA/LTA event detection configuration (windows in seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaLtaConfig {
    pub sta_window: f64,
    pub lta_window: f64,
    pub threshold: f64,
}

impl Default for StaLtaConfig {
    fn default() -> Self {
        Self {
            sta_window: 1.0,
            lta_window: 20.0,
            threshold: 3.0,
        }
    }
}

/// Signal/noise split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub method: SplitMethod,
    /// Assumed P-wave velocity in km/s for the `velocity` method
    pub p_velocity: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            method: SplitMethod::Velocity,
            p_velocity: 7.0,
        }
    }
}

/// Corner frequency selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerConfig {
    /// Select corners from the signal-to-noise ratio; otherwise use the defaults as-is
    pub dynamic: bool,
    pub snr_ratio: f64,
    pub default_low_frequency: f64,
    pub default_high_frequency: f64,
    /// Band (Hz) the usable bandwidth must contain
    pub reference_band: [f64; 2],
    /// Width of the spectral smoothing window, in octaves
    pub smoothing_octaves: f64,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            dynamic: true,
            snr_ratio: 3.0,
            default_low_frequency: 0.1,
            default_high_frequency: 20.0,
            reference_band: [0.1, 5.0],
            smoothing_octaves: 1.0 / 3.0,
        }
    }
}

/// Detrend, taper and Butterworth filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub order: usize,
    pub zero_phase: bool,
    /// Fraction of the trace tapered at each end
    pub taper_fraction: f64,
    pub detrend: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            order: 4,
            zero_phase: true,
            taper_fraction: 0.05,
            detrend: true,
        }
    }
}

/// Baseline correction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub enabled: bool,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Processing window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub enabled: bool,
    /// Slowest phase velocity (km/s) that must fit in the window
    pub vmin: f64,
    /// Minimum window duration in seconds
    pub min_duration: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vmin: 1.0,
            min_duration: 120.0,
        }
    }
}

/// P-wave picker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub enabled: bool,
    pub band: [f64; 2],
    pub sta_window: f64,
    pub lta_window: f64,
    pub threshold: f64,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band: [1.0, 6.0],
            sta_window: 0.5,
            lta_window: 10.0,
            threshold: 4.0,
        }
    }
}

/// What the metrics layer does with streams whose processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStreamPolicy {
    /// Do not compute metrics for failed streams
    Skip,
    /// Compute metrics and mark the summary as failed
    Flag,
}

/// Intensity measure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub damping_ratio: f64,
    pub rotation_step_deg: f64,
    pub failed_stream_policy: FailedStreamPolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            damping_ratio: 0.05,
            rotation_step_deg: 1.0,
            failed_stream_policy: FailedStreamPolicy::Flag,
        }
    }
}

fn invalid(msg: impl Into<String>) -> GmError {
    GmError::ConfigValidationFailed(msg.into())
}

/// Validate configuration ranges
pub fn validate_config(config: &Config) -> Result<()> {
    let amp = &config.amplitude;
    if !(amp.min_amp > 0.0 && amp.min_amp < amp.max_amp) {
        return Err(invalid("amplitude.min_amp must be positive and < max_amp"));
    }

    let sl = &config.sta_lta;
    if !(sl.sta_window > 0.0 && sl.sta_window < sl.lta_window) {
        return Err(invalid("sta_lta.sta_window must be positive and < lta_window"));
    }
    if sl.threshold <= 0.0 {
        return Err(invalid("sta_lta.threshold must be positive"));
    }

    if config.split.p_velocity <= 0.0 {
        return Err(invalid("split.p_velocity must be positive"));
    }

    let c = &config.corners;
    if c.snr_ratio <= 0.0 {
        return Err(invalid("corners.snr_ratio must be positive"));
    }
    if !(c.default_low_frequency > 0.0 && c.default_low_frequency < c.default_high_frequency) {
        return Err(invalid(
            "corners.default_low_frequency must be positive and < default_high_frequency",
        ));
    }
    if !(c.reference_band[0] > 0.0 && c.reference_band[0] <= c.reference_band[1]) {
        return Err(invalid("corners.reference_band must be positive and ordered"));
    }
    if c.smoothing_octaves < 0.0 {
        return Err(invalid("corners.smoothing_octaves must not be negative"));
    }

    let f = &config.filter;
    if !(1..=12).contains(&f.order) {
        return Err(invalid("filter.order must be between 1 and 12"));
    }
    if !(0.0..=0.5).contains(&f.taper_fraction) {
        return Err(invalid("filter.taper_fraction must be within [0, 0.5]"));
    }

    let w = &config.window;
    if w.vmin <= 0.0 || w.min_duration < 0.0 {
        return Err(invalid("window.vmin must be positive and min_duration non-negative"));
    }

    let p = &config.picker;
    if !(p.band[0] > 0.0 && p.band[0] < p.band[1]) {
        return Err(invalid("picker.band must be positive and ordered"));
    }
    if !(p.sta_window > 0.0 && p.sta_window < p.lta_window) {
        return Err(invalid("picker.sta_window must be positive and < lta_window"));
    }

    validate_metrics_config(&config.metrics)
}

/// Validate the intensity measure section on its own
pub fn validate_metrics_config(m: &MetricsConfig) -> Result<()> {
    if !(m.damping_ratio > 0.0 && m.damping_ratio < 1.0) {
        return Err(invalid("metrics.damping_ratio must be within (0, 1)"));
    }
    if !(m.rotation_step_deg > 0.0 && m.rotation_step_deg <= 90.0) {
        return Err(invalid("metrics.rotation_step_deg must be within (0, 90]"));
    }
    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.corners.default_low_frequency, 0.1);
        assert_eq!(config.corners.default_high_frequency, 20.0);
        assert_eq!(config.split.method, SplitMethod::Velocity);
    }

    #[test]
    fn test_rejects_inverted_amplitude_range() {
        let mut config = Config::default();
        config.amplitude.min_amp = 1.0;
        config.amplitude.max_amp = 0.5;
        assert!(matches!(
            validate_config(&config),
            Err(GmError::ConfigValidationFailed(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "corners": { "snr_ratio": 5.0 }, "split": { "method": "p_arrival" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.corners.snr_ratio, 5.0);
        assert_eq!(config.corners.default_high_frequency, 20.0);
        assert_eq!(config.split.method, SplitMethod::PArrival);
        assert_eq!(config.sta_lta.lta_window, 20.0);
    }

    #[test]
    fn test_unknown_split_method_fails_to_parse() {
        let json = r#"{ "split": { "method": "invalid" } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
