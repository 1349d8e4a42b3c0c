//! Error types for touchline-hal

use thiserror::Error;

/// Errors that can occur at the sensor hardware boundary
#[derive(Error, Debug)]
pub enum HalError {
    /// Transport/IPC failure talking to the sensor service
    #[error("Sensor transport failure: {0}")]
    Transport(String),

    /// Sensor firmware does not implement the requested test kernel
    #[error("Unsupported test kernel: {kind}")]
    UnsupportedTest { kind: String },

    /// Scripted sensor was asked for a reading it has no script for
    #[error("No scripted reading queued for test kernel: {kind}")]
    ScriptExhausted { kind: String },

    /// Device reported a geometry the host cannot work with
    #[error("Device reported degenerate geometry: {rows}x{cols}")]
    BadGeometry { rows: usize, cols: usize },
}

/// Result type for sensor boundary operations
pub type HalResult<T> = std::result::Result<T, HalError>;
