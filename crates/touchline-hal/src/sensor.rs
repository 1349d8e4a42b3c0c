//! Sensor boundary definitions for Touchline
//!
//! This module defines the contract between the test engine and whatever
//! actually talks to the touch controller:
//! - `SensorLink`: the async hardware-access trait the engine consumes
//! - reading structs carrying the signed result code plus raw buffers
//! - `DeviceGeometry` / `ChannelWindow` / `TestKind` value types
//!
//! The trait is async and backend-agnostic. A scripted in-memory fake is
//! provided for testing and dry runs via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HalResult;

// ---------------------------------------------------------------------------
// DeviceGeometry / ChannelWindow
// ---------------------------------------------------------------------------

/// Row/column geometry of the sensing matrix, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGeometry {
    /// Number of sense rows
    pub rows: usize,
    /// Number of sense columns
    pub cols: usize,
}

impl DeviceGeometry {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Element count of one full frame snapshot.
    pub fn frame_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Element count of one profile (per-row + per-column aggregate) buffer.
    pub fn profile_len(&self) -> usize {
        self.rows + self.cols
    }
}

impl std::fmt::Display for DeviceGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Receive/transmit channel assignment window for the per-channel short
/// tests. Offsets and lengths index into the controller's pin map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelWindow {
    pub rx_offset: u16,
    pub rx_len: u16,
    pub tx_offset: u16,
    pub tx_len: u16,
}

impl ChannelWindow {
    /// Whether a physical pin index falls inside the assigned rx or tx range.
    pub fn contains_pin(&self, pin: usize) -> bool {
        let rx = self.rx_offset as usize..(self.rx_offset as usize + self.rx_len as usize);
        let tx = self.tx_offset as usize..(self.tx_offset as usize + self.tx_len as usize);
        rx.contains(&pin) || tx.contains(&pin)
    }
}

// ---------------------------------------------------------------------------
// TestKind
// ---------------------------------------------------------------------------

/// Identifier of one hardware test kernel.
///
/// The numeric codes travel over the wire to the sensor service; everything
/// else about a kind (config keys, size contracts, report layout) lives in
/// the engine's catalog, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Noise,
    FullRawCap,
    DynamicRange,
    FullRawPt05,
    TrxTrxShortPt01,
    TrxGroundPt03,
    AdcRangePt11,
    AbsRawPt12,
    AbsNoisePt1d,
    ExHighResistance,
    ExTrxShort,
}

impl TestKind {
    /// Stable name used in plans, logs and report section headers.
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::Noise => "noise",
            TestKind::FullRawCap => "full_raw_cap",
            TestKind::DynamicRange => "dynamic_range",
            TestKind::FullRawPt05 => "full_raw_pt05",
            TestKind::TrxTrxShortPt01 => "trx_trx_short_pt01",
            TestKind::TrxGroundPt03 => "trx_ground_pt03",
            TestKind::AdcRangePt11 => "adc_range_pt11",
            TestKind::AbsRawPt12 => "abs_raw_pt12",
            TestKind::AbsNoisePt1d => "abs_noise_pt1d",
            TestKind::ExHighResistance => "ex_high_resistance",
            TestKind::ExTrxShort => "ex_trx_short",
        }
    }

    /// Wire code of the test kernel in the sensor service protocol.
    pub fn code(&self) -> u8 {
        match self {
            TestKind::TrxTrxShortPt01 => 0x01,
            TestKind::TrxGroundPt03 => 0x03,
            TestKind::FullRawPt05 => 0x05,
            TestKind::Noise => 0x0e,
            TestKind::FullRawCap => 0x0f,
            TestKind::DynamicRange => 0x10,
            TestKind::AdcRangePt11 => 0x11,
            TestKind::AbsRawPt12 => 0x12,
            TestKind::AbsNoisePt1d => 0x1d,
            TestKind::ExHighResistance => 0x1e,
            TestKind::ExTrxShort => 0x1f,
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Raw outcome of one generic test kernel invocation.
///
/// `code` follows the plant sign convention: negative means the kernel could
/// not execute, zero is a pass, positive is a fail carrying a kind-specific
/// diagnostic value (e.g. a failed-frame count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReading {
    pub code: i32,
    /// Device-geometry-sized result buffer (frame, profile or raw pin bytes).
    pub data: Vec<i32>,
}

/// Outcome of the extended high-resistance kernel: one full frame of deltas
/// against the reference plus per-receiver and per-transmitter profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExHighResistanceReading {
    pub code: i32,
    pub frame: Vec<i32>,
    pub rx_profile: Vec<i32>,
    pub tx_profile: Vec<i32>,
}

/// Outcome of the extended TRx short kernel: per-pin states plus the two
/// extended-pin states. Pin values are `0`/`1` (no short / short) or `-1`
/// for pins outside the assigned channel window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExTrxShortReading {
    pub code: i32,
    pub pins: Vec<i32>,
    pub ex_pins: Vec<i32>,
}

// ---------------------------------------------------------------------------
// SensorLink
// ---------------------------------------------------------------------------

/// Hardware-access boundary to the touch controller.
///
/// Guarantees:
/// - `run_test` fills exactly `data_len` elements on any non-negative code.
/// - A negative `code` means the kernel did not execute; `error_message`
///   then describes why, in firmware terms.
/// - Calls are blocking from the caller's perspective; the engine applies
///   no timeout (a hung kernel blocks the campaign worker).
#[async_trait]
pub trait SensorLink: Send + Sync {
    /// Report the sensing-matrix geometry.
    async fn geometry(&self) -> HalResult<DeviceGeometry>;

    /// Execute one generic test kernel with up to two limit slots.
    ///
    /// Empty slots are passed as empty slices; populated slots are sized
    /// either 1 (firmware-side broadcast) or `data_len`.
    async fn run_test(
        &self,
        kind: TestKind,
        geometry: DeviceGeometry,
        limit_lo: &[i32],
        limit_hi: &[i32],
        data_len: usize,
    ) -> HalResult<TestReading>;

    /// Execute the extended high-resistance kernel against a full-frame
    /// reference and three scalar thresholds.
    async fn run_ex_high_resistance(
        &self,
        geometry: DeviceGeometry,
        reference: &[i32],
        tixel_limit: i32,
        rx_roe_limit: i32,
        tx_roe_limit: i32,
    ) -> HalResult<ExHighResistanceReading>;

    /// Execute the extended TRx short kernel with a per-channel limit array
    /// and the 2-element extended-pin limit.
    async fn run_ex_trx_short(
        &self,
        geometry: DeviceGeometry,
        channel_limit: &[i32],
        ex_pin_limit: [i32; 2],
    ) -> HalResult<ExTrxShortReading>;

    /// Validate a channel assignment window against the device's pin map.
    async fn check_channel_assignment(&self, window: ChannelWindow) -> HalResult<bool>;

    /// Firmware-side description of the most recent kernel failure.
    async fn error_message(&self) -> String;
}
