//! Strong-motion record processing
//!
//! Automated quality control and conditioning of ground-motion recordings
//! (amplitude and STA/LTA gates, signal-to-noise corner selection, filtering,
//! baseline correction, windowing) followed by intensity measures (PGA, PGV,
//! spectral acceleration, Arias intensity) under several horizontal-component
//! conventions.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod phase;
pub mod process;
pub mod signal;
pub mod spectral;
pub mod stream;
pub mod trace;

pub use config::Config;
pub use error::{GmError, Result};
pub use event::EventInfo;
pub use metrics::{CollectionSummary, Imc, Imt, MetricTable, StationSummary};
pub use process::corners::CornerFrequencies;
pub use process::record::{FailureReason, ProcessingRecord, ProcessingStage};
pub use stream::Stream;
pub use trace::{TimeSeries, Timestamp, Trace, TraceStats, Units};

/// Processing and metrics driven by one configuration
pub struct GroundMotionProcessor {
    config: Config,
}

impl GroundMotionProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the processing pipeline on every trace of a stream
    pub fn process(&self, stream: Stream, event: &EventInfo) -> Result<Stream> {
        process::process_stream(stream, event, &self.config)
    }

    /// Process a stream and compute the requested metrics.
    ///
    /// Under the `skip` policy a stream that failed processing yields `None`.
    pub fn summarize<S: AsRef<str>>(
        &self,
        stream: Stream,
        event: &EventInfo,
        imcs: &[S],
        imts: &[S],
    ) -> Result<(Stream, Option<StationSummary>)> {
        let processed = self.process(stream, event)?;
        if !processed.passed()
            && self.config.metrics.failed_stream_policy == config::FailedStreamPolicy::Skip
        {
            return Ok((processed, None));
        }
        let summary = StationSummary::from_stream(&processed, imcs, imts, &self.config.metrics)?;
        Ok((processed, Some(summary)))
    }
}

/// Validate a configuration before processing
pub fn validate_input(config: &Config) -> Result<()> {
    config::validate_config(config)
}
