//! Error taxonomy for Touchline limits loading and resolution.

use std::path::PathBuf;

use touchline_hal::ChannelWindow;

/// Errors that abort configuration loading before any test can run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("limits file unreadable: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mandatory geometry key missing or non-numeric: {key}")]
    MissingGeometryKey { key: &'static str },

    #[error("limits file geometry disagrees with device: {key} = {file_value}, device reports {device_value}")]
    GeometryMismatch {
        key: &'static str,
        file_value: i32,
        device_value: usize,
    },
}

/// Per-item resolution errors. These never abort a campaign; the affected
/// item is marked as having no valid configuration and reported inline.
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    #[error("limit key absent or unparsable: {key}")]
    Missing { key: String },

    #[error("limit {key} resolved to {found} element(s); expected {least} or {most}")]
    Shape {
        key: String,
        found: usize,
        least: usize,
        most: usize,
    },

    #[error("channel metadata invalid: {key} = {value}")]
    ChannelMetadata { key: String, value: i32 },

    #[error("channel assignment rejected by device: rx {rx_offset}+{rx_len}, tx {tx_offset}+{tx_len}")]
    ChannelAssignment {
        rx_offset: u16,
        rx_len: u16,
        tx_offset: u16,
        tx_len: u16,
    },

    #[error("sensor unreachable during channel validation: {0}")]
    Hal(#[from] touchline_hal::HalError),
}

impl LimitError {
    pub(crate) fn channel_assignment(window: ChannelWindow) -> Self {
        LimitError::ChannelAssignment {
            rx_offset: window.rx_offset,
            rx_len: window.rx_len,
            tx_offset: window.tx_offset,
            tx_len: window.tx_len,
        }
    }
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::GeometryMismatch {
            key: "NUM_OF_ROW",
            file_value: 16,
            device_value: 18,
        };
        let msg = err.to_string();
        assert!(msg.contains("NUM_OF_ROW"));
        assert!(msg.contains("16"));
        assert!(msg.contains("18"));
    }

    #[test]
    fn test_limit_error_display() {
        let err = LimitError::Shape {
            key: "NOISE_TEST_LIMIT".to_string(),
            found: 5,
            least: 1,
            most: 576,
        };
        let msg = err.to_string();
        assert!(msg.contains("NOISE_TEST_LIMIT"));
        assert!(msg.contains("5 element(s)"));
        assert!(msg.contains("576"));
    }
}
