//! Touchline HAL: Sensor Hardware Boundary
//!
//! This crate defines the contract between the Touchline test engine and the
//! process that actually drives the touch controller (native service, bench
//! fixture, or the scripted fake).
//!
//! ## Layer 0 - Hardware Access
//!
//! Focus: a minimal, object-safe async trait plus the raw reading types the
//! test kernels produce. No policy lives here; limit resolution and result
//! interpretation belong to the engine crates.
//!
//! ## Key Components
//!
//! - `SensorLink`: the hardware-access trait
//! - `TestReading` / `ExHighResistanceReading` / `ExTrxShortReading`
//! - `ScriptedSensor`: in-memory fake for tests and dry runs

mod error;
pub mod fakes;
mod sensor;

pub use error::{HalError, HalResult};
pub use fakes::{ScriptedSensor, EX_PIN_COUNT, PIN_BYTES, PIN_COUNT};
pub use sensor::{
    ChannelWindow, DeviceGeometry, ExHighResistanceReading, ExTrxShortReading, SensorLink,
    TestKind, TestReading,
};
