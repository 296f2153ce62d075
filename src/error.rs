//! Crate-wide error taxonomy
//!
//! Validation failures are reported before any hardware command is
//! issued. Hardware faults are surfaced distinctly and never swallowed
//! outside the idempotent teardown paths.

use thiserror::Error;

use crate::hal::HardwareError;
use crate::types::DisplayTarget;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, DisplayError>;

/// Errors reported by display sessions and the output service
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The uri cannot be carried to the hardware (e.g. interior NUL)
    #[error("uri is not a usable path: {0:?}")]
    InvalidUri(String),

    /// An argument had the right kind but an out-of-domain value
    #[error("invalid {kind} '{value}'")]
    InvalidValue {
        /// What was being parsed or validated
        kind: &'static str,
        /// The offending value
        value: String,
    },

    /// The image resource could not be resolved or read
    #[error("cannot open image resource '{uri}': {source}")]
    ResourceIo {
        /// The locator that failed to resolve
        uri: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The session is already presenting an image
    #[error("session already open (showing '{0}'); close it first")]
    SessionBusy(String),

    /// Another session owns the requested output
    #[error("output {0} is already owned by another session")]
    OutputBusy(DisplayTarget),

    /// The pipeline or output hardware reported a runtime failure
    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

impl DisplayError {
    pub(crate) fn invalid_value(kind: &'static str, value: impl Into<String>) -> Self {
        DisplayError::InvalidValue { kind, value: value.into() }
    }
}
