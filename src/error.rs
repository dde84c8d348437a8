//! Error types for the ground-motion processing system
//!
//! Only usage and programming errors live here. Data-quality outcomes
//! (amplitude out of range, no detectable event, poor signal-to-noise) are
//! not errors: they are recorded as a failed verdict on the trace.

use thiserror::Error;

/// Custom error type for ground-motion processing
#[derive(Debug, Error)]
pub enum GmError {
    /// E001: Event metadata required by the chosen split method is missing
    #[error("E001: Missing event metadata - {0}")]
    MissingEventMetadata(String),
    /// E002: Unrecognized signal/noise split method
    #[error("E002: Unknown split method '{0}' (expected 'velocity' or 'p_arrival')")]
    UnknownSplitMethod(String),
    /// E003: Configuration validation failed
    #[error("E003: Configuration validation failed - {0}")]
    ConfigValidationFailed(String),
    /// E004: Wrong number of horizontal channels for a two-horizontal IMC
    #[error("E004: {imc} requires exactly two horizontal channels, found {found}")]
    HorizontalChannelCount { imc: String, found: usize },
    /// E005: I/O error
    #[error("E005: I/O error - {0}")]
    Io(#[from] std::io::Error),
    /// E006: JSON (de)serialization error
    #[error("E006: JSON error - {0}")]
    Json(#[from] serde_json::Error),
    /// E007: Window start lies after the end of the trace
    #[error("E007: Window start {start} is after trace end {end}")]
    WindowStartAfterEnd { start: String, end: String },
    /// E008: Traces cannot be grouped into one stream
    #[error("E008: Inconsistent stream - {0}")]
    InconsistentStream(String),
    /// E009: Trace already carries a processing record
    #[error("E009: Trace {0} has already been processed")]
    AlreadyProcessed(String),
    /// E010: Input units are not what the computation expects
    #[error("E010: Units mismatch - {0}")]
    UnitsMismatch(String),
    /// E011: Trace is unusable for the requested operation (empty, bad sample interval)
    #[error("E011: Invalid trace - {0}")]
    InvalidTrace(String),
}

/// Result type alias for ground-motion operations
pub type Result<T> = std::result::Result<T, GmError>;
