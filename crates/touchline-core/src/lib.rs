//! Touchline Core Library
//!
//! Limits-file parsing, the production test catalog, and limit resolution
//! for the Touchline capacitive-touch test engine.

pub mod catalog;
pub mod config;
pub mod digest;
pub mod error;
pub mod limits;
pub mod telemetry;

pub use catalog::{
    descriptor, DataLayout, LimitKeys, TestDescriptor, CAMPAIGN_ORDER, EX_TRX_CHANNEL_COUNT,
};
pub use config::{LimitsDoc, COL_COUNT_KEY, ROW_COUNT_KEY};
pub use digest::LimitsDigest;
pub use error::{ConfigError, LimitError, Result};
pub use limits::{resolve, resolve_all, Limit, TestItem};
pub use telemetry::init_tracing;

/// Touchline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
