//! In-memory scripted sensor (testing and dry runs)
//!
//! Provides `ScriptedSensor`, a `SensorLink` implementation that replays
//! queued readings instead of talking to hardware. Engine tests script
//! exact outcomes per test kernel; the CLI uses the permissive mode to
//! dry-run a campaign plan with all-pass readings.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{HalError, HalResult};
use crate::sensor::*;

/// Raw pin-test buffers are fixed at 8 bytes by the controller protocol.
pub const PIN_BYTES: usize = 8;
/// Number of physical pins rendered from the raw pin bytes.
pub const PIN_COUNT: usize = 64;
/// Extended-pin count of the extended TRx short kernel.
pub const EX_PIN_COUNT: usize = 2;

#[derive(Debug, Default)]
struct Script {
    readings: HashMap<TestKind, VecDeque<TestReading>>,
    ex_high_resistance: VecDeque<ExHighResistanceReading>,
    ex_trx_short: VecDeque<ExTrxShortReading>,
}

/// Scripted in-memory sensor.
///
/// Strict by default: an unscripted kernel invocation fails with
/// `HalError::ScriptExhausted`. `permissive()` flips unscripted calls to
/// all-pass readings of the right size instead.
#[derive(Debug)]
pub struct ScriptedSensor {
    geometry: DeviceGeometry,
    script: Mutex<Script>,
    dispatched: Mutex<Vec<TestKind>>,
    accept_channel_windows: bool,
    pass_when_unscripted: bool,
    error_text: Mutex<String>,
}

impl ScriptedSensor {
    pub fn new(geometry: DeviceGeometry) -> Self {
        Self {
            geometry,
            script: Mutex::new(Script::default()),
            dispatched: Mutex::new(Vec::new()),
            accept_channel_windows: true,
            pass_when_unscripted: false,
            error_text: Mutex::new(String::new()),
        }
    }

    /// Sensor that answers every unscripted kernel with a passing reading.
    pub fn permissive(geometry: DeviceGeometry) -> Self {
        let mut sensor = Self::new(geometry);
        sensor.pass_when_unscripted = true;
        sensor
    }

    /// Queue a reading for one generic kernel (FIFO per kind).
    pub fn script(self, kind: TestKind, reading: TestReading) -> Self {
        self.script
            .lock()
            .unwrap()
            .readings
            .entry(kind)
            .or_default()
            .push_back(reading);
        self
    }

    /// Queue a reading for the extended high-resistance kernel.
    pub fn script_ex_high_resistance(self, reading: ExHighResistanceReading) -> Self {
        self.script
            .lock()
            .unwrap()
            .ex_high_resistance
            .push_back(reading);
        self
    }

    /// Queue a reading for the extended TRx short kernel.
    pub fn script_ex_trx_short(self, reading: ExTrxShortReading) -> Self {
        self.script.lock().unwrap().ex_trx_short.push_back(reading);
        self
    }

    /// Make `check_channel_assignment` reject every window.
    pub fn rejecting_channel_windows(mut self) -> Self {
        self.accept_channel_windows = false;
        self
    }

    /// Set the firmware error text returned by `error_message`.
    pub fn with_error_text(self, text: impl Into<String>) -> Self {
        *self.error_text.lock().unwrap() = text.into();
        self
    }

    /// Kernel invocations observed so far, in dispatch order.
    pub fn dispatched(&self) -> Vec<TestKind> {
        self.dispatched.lock().unwrap().clone()
    }

    fn record_dispatch(&self, kind: TestKind) {
        self.dispatched.lock().unwrap().push(kind);
    }
}

#[async_trait]
impl SensorLink for ScriptedSensor {
    async fn geometry(&self) -> HalResult<DeviceGeometry> {
        if self.geometry.rows == 0 || self.geometry.cols == 0 {
            return Err(HalError::BadGeometry {
                rows: self.geometry.rows,
                cols: self.geometry.cols,
            });
        }
        Ok(self.geometry)
    }

    async fn run_test(
        &self,
        kind: TestKind,
        _geometry: DeviceGeometry,
        _limit_lo: &[i32],
        _limit_hi: &[i32],
        data_len: usize,
    ) -> HalResult<TestReading> {
        self.record_dispatch(kind);
        let mut script = self.script.lock().unwrap();
        if let Some(reading) = script.readings.get_mut(&kind).and_then(VecDeque::pop_front) {
            return Ok(reading);
        }
        if self.pass_when_unscripted {
            return Ok(TestReading {
                code: 0,
                data: vec![0; data_len],
            });
        }
        Err(HalError::ScriptExhausted {
            kind: kind.to_string(),
        })
    }

    async fn run_ex_high_resistance(
        &self,
        geometry: DeviceGeometry,
        _reference: &[i32],
        _tixel_limit: i32,
        _rx_roe_limit: i32,
        _tx_roe_limit: i32,
    ) -> HalResult<ExHighResistanceReading> {
        self.record_dispatch(TestKind::ExHighResistance);
        let mut script = self.script.lock().unwrap();
        if let Some(reading) = script.ex_high_resistance.pop_front() {
            return Ok(reading);
        }
        if self.pass_when_unscripted {
            return Ok(ExHighResistanceReading {
                code: 0,
                frame: vec![0; geometry.frame_len()],
                rx_profile: vec![0; geometry.cols],
                tx_profile: vec![0; geometry.rows],
            });
        }
        Err(HalError::ScriptExhausted {
            kind: TestKind::ExHighResistance.to_string(),
        })
    }

    async fn run_ex_trx_short(
        &self,
        _geometry: DeviceGeometry,
        _channel_limit: &[i32],
        _ex_pin_limit: [i32; 2],
    ) -> HalResult<ExTrxShortReading> {
        self.record_dispatch(TestKind::ExTrxShort);
        let mut script = self.script.lock().unwrap();
        if let Some(reading) = script.ex_trx_short.pop_front() {
            return Ok(reading);
        }
        if self.pass_when_unscripted {
            return Ok(ExTrxShortReading {
                code: 0,
                pins: vec![0; PIN_COUNT],
                ex_pins: vec![0; EX_PIN_COUNT],
            });
        }
        Err(HalError::ScriptExhausted {
            kind: TestKind::ExTrxShort.to_string(),
        })
    }

    async fn check_channel_assignment(&self, _window: ChannelWindow) -> HalResult<bool> {
        Ok(self.accept_channel_windows)
    }

    async fn error_message(&self) -> String {
        self.error_text.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> DeviceGeometry {
        DeviceGeometry::new(4, 6)
    }

    #[tokio::test]
    async fn test_scripted_reading_replayed_in_order() {
        let sensor = ScriptedSensor::new(geometry())
            .script(
                TestKind::Noise,
                TestReading {
                    code: 0,
                    data: vec![1; 24],
                },
            )
            .script(
                TestKind::Noise,
                TestReading {
                    code: 3,
                    data: vec![9; 24],
                },
            );

        let first = sensor
            .run_test(TestKind::Noise, geometry(), &[], &[40], 24)
            .await
            .expect("first reading");
        assert_eq!(first.code, 0);

        let second = sensor
            .run_test(TestKind::Noise, geometry(), &[], &[40], 24)
            .await
            .expect("second reading");
        assert_eq!(second.code, 3);
        assert_eq!(sensor.dispatched(), vec![TestKind::Noise, TestKind::Noise]);
    }

    #[tokio::test]
    async fn test_strict_sensor_fails_when_unscripted() {
        let sensor = ScriptedSensor::new(geometry());
        let err = sensor
            .run_test(TestKind::Noise, geometry(), &[], &[], 24)
            .await
            .expect_err("unscripted call must fail");
        assert!(matches!(err, HalError::ScriptExhausted { .. }));
    }

    #[tokio::test]
    async fn test_permissive_sensor_passes_with_sized_buffer() {
        let sensor = ScriptedSensor::permissive(geometry());
        let reading = sensor
            .run_test(TestKind::FullRawCap, geometry(), &[100], &[3000], 24)
            .await
            .expect("permissive reading");
        assert_eq!(reading.code, 0);
        assert_eq!(reading.data.len(), 24);

        let ex = sensor
            .run_ex_trx_short(geometry(), &[5; 55], [2, 2])
            .await
            .expect("permissive ex reading");
        assert_eq!(ex.pins.len(), PIN_COUNT);
        assert_eq!(ex.ex_pins.len(), EX_PIN_COUNT);
    }

    #[tokio::test]
    async fn test_channel_window_rejection() {
        let sensor = ScriptedSensor::new(geometry()).rejecting_channel_windows();
        let window = ChannelWindow {
            rx_offset: 0,
            rx_len: 4,
            tx_offset: 4,
            tx_len: 6,
        };
        let accepted = sensor
            .check_channel_assignment(window)
            .await
            .expect("check");
        assert!(!accepted);
    }

    #[tokio::test]
    async fn test_degenerate_geometry_rejected() {
        let sensor = ScriptedSensor::new(DeviceGeometry::new(0, 6));
        let err = sensor.geometry().await.expect_err("bad geometry");
        assert!(matches!(err, HalError::BadGeometry { .. }));
    }
}
