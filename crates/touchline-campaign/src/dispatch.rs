//! Test dispatch: geometry/arity selection per kind and the hardware call.
//!
//! The dispatcher owns the size contracts: it picks the result-buffer
//! length from the kind's data layout, broadcasts scalar limits to their
//! slot's full arity, and routes the two extended kinds to their dedicated
//! kernel entry points. Signed result codes are classified here; rendering
//! them is the formatter's job.

use thiserror::Error;
use tracing::debug;

use touchline_core::{descriptor, LimitKeys, Limit, TestItem, EX_TRX_CHANNEL_COUNT};
use touchline_hal::{
    DeviceGeometry, ExHighResistanceReading, ExTrxShortReading, HalError, SensorLink, TestKind,
    TestReading,
};

/// Dispatch failures. These never reach the hardware: the campaign records
/// the affected item as an error-out result and moves on.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Degenerate geometry produced a zero-sized result buffer.
    #[error("zero-sized result buffer for {kind} on geometry {geometry}")]
    EmptyDataSize {
        kind: TestKind,
        geometry: DeviceGeometry,
    },

    /// A required limit slot is unset (item had no valid configuration).
    #[error("test item {kind} has no valid configuration")]
    MissingConfiguration { kind: TestKind },

    /// The hardware boundary itself failed before a code was produced.
    #[error("hardware boundary failure: {0}")]
    Hal(#[from] HalError),
}

/// Raw execution output, paired with the materialized limits so the
/// formatter can embed them in the report section.
#[derive(Debug, Clone)]
pub enum Execution {
    Generic {
        reading: TestReading,
        limit_lo: Vec<i32>,
        limit_hi: Vec<i32>,
    },
    ExHighResistance {
        reading: ExHighResistanceReading,
    },
    ExTrxShort {
        reading: ExTrxShortReading,
        channel_limit: Vec<i32>,
    },
}

impl Execution {
    /// Signed result code reported by the kernel.
    pub fn code(&self) -> i32 {
        match self {
            Execution::Generic { reading, .. } => reading.code,
            Execution::ExHighResistance { reading } => reading.code,
            Execution::ExTrxShort { reading, .. } => reading.code,
        }
    }
}

/// Plant sign convention over kernel result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    /// Negative: the kernel did not execute.
    ErrorOut,
    /// Zero: pass.
    Pass,
    /// Positive: fail, carrying a kind-specific diagnostic value.
    Fail(i32),
}

/// Classify a signed kernel result code.
pub fn classify(code: i32) -> ResultClass {
    match code {
        c if c < 0 => ResultClass::ErrorOut,
        0 => ResultClass::Pass,
        c => ResultClass::Fail(c),
    }
}

/// Test executor: one kernel invocation per call, no retries.
pub struct TestExecutor;

impl TestExecutor {
    /// Execute one resolved test item against the sensor.
    pub async fn execute(
        item: &TestItem,
        geometry: DeviceGeometry,
        sensor: &dyn SensorLink,
    ) -> Result<Execution, DispatchError> {
        let desc = descriptor(item.kind);
        let data_len = desc.layout.data_len(geometry);
        if data_len == 0 {
            return Err(DispatchError::EmptyDataSize {
                kind: item.kind,
                geometry,
            });
        }

        debug!(kind = %item.kind, data_len, "dispatching test kernel");

        match desc.keys {
            LimitKeys::MaxOnly { .. } => {
                let limit_hi = materialize(item.kind, item.limit_hi.as_ref(), data_len)?;
                let reading = sensor
                    .run_test(item.kind, geometry, &[], &limit_hi, data_len)
                    .await?;
                Ok(Execution::Generic {
                    reading,
                    limit_lo: Vec::new(),
                    limit_hi,
                })
            }
            LimitKeys::MinMax { .. } => {
                let limit_lo = materialize(item.kind, item.limit_lo.as_ref(), data_len)?;
                let limit_hi = materialize(item.kind, item.limit_hi.as_ref(), data_len)?;
                let reading = sensor
                    .run_test(item.kind, geometry, &limit_lo, &limit_hi, data_len)
                    .await?;
                Ok(Execution::Generic {
                    reading,
                    limit_lo,
                    limit_hi,
                })
            }
            LimitKeys::Channel { .. } => {
                let limit_lo =
                    item.custom_limit
                        .clone()
                        .ok_or(DispatchError::MissingConfiguration {
                            kind: item.kind,
                        })?;
                let reading = sensor
                    .run_test(item.kind, geometry, &limit_lo, &[], data_len)
                    .await?;
                Ok(Execution::Generic {
                    reading,
                    limit_lo,
                    limit_hi: Vec::new(),
                })
            }
            LimitKeys::ExHighResistance { .. } => {
                let reference = item.reference_frame.as_deref().ok_or(
                    DispatchError::MissingConfiguration { kind: item.kind },
                )?;
                let (Some(tixels), Some(rx_roe), Some(tx_roe)) =
                    (item.tixel_limit, item.rx_roe_limit, item.tx_roe_limit)
                else {
                    return Err(DispatchError::MissingConfiguration { kind: item.kind });
                };
                let reading = sensor
                    .run_ex_high_resistance(geometry, reference, tixels, rx_roe, tx_roe)
                    .await?;
                Ok(Execution::ExHighResistance { reading })
            }
            LimitKeys::ExTrxShort { .. } => {
                let channel_limit =
                    materialize(item.kind, item.limit_lo.as_ref(), EX_TRX_CHANNEL_COUNT)?;
                let ex_pin_limit = item
                    .ex_pin_limit
                    .ok_or(DispatchError::MissingConfiguration { kind: item.kind })?;
                let reading = sensor
                    .run_ex_trx_short(geometry, &channel_limit, ex_pin_limit)
                    .await?;
                Ok(Execution::ExTrxShort {
                    reading,
                    channel_limit,
                })
            }
        }
    }
}

/// Expand a resolved limit slot to its dispatch arity.
fn materialize(
    kind: TestKind,
    limit: Option<&Limit>,
    len: usize,
) -> Result<Vec<i32>, DispatchError> {
    limit
        .map(|l| l.materialize(len))
        .ok_or(DispatchError::MissingConfiguration { kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchline_core::{resolve, LimitsDoc};
    use touchline_hal::ScriptedSensor;

    fn geometry() -> DeviceGeometry {
        DeviceGeometry::new(2, 3)
    }

    fn doc(body: &str) -> LimitsDoc {
        let text = format!("NUM_OF_ROW = 2\nNUM_OF_COL = 3\n{body}");
        LimitsDoc::parse(&text, geometry()).expect("parse")
    }

    #[test]
    fn test_sign_convention() {
        assert_eq!(classify(-1), ResultClass::ErrorOut);
        assert_eq!(classify(0), ResultClass::Pass);
        assert_eq!(classify(5), ResultClass::Fail(5));
    }

    #[tokio::test]
    async fn test_scalar_limits_are_broadcast_to_frame_size() {
        let doc = doc("FULL_RAW_CAP_LIMIT_MIN = 100\nFULL_RAW_CAP_LIMIT_MAX = 3000\n");
        let sensor = ScriptedSensor::permissive(geometry());
        let item = resolve(TestKind::FullRawCap, &doc, geometry(), &sensor).await;

        let execution = TestExecutor::execute(&item, geometry(), &sensor)
            .await
            .expect("dispatch");
        let Execution::Generic {
            reading,
            limit_lo,
            limit_hi,
        } = execution
        else {
            panic!("expected generic execution");
        };
        assert_eq!(reading.code, 0);
        assert_eq!(limit_lo, vec![100; 6]);
        assert_eq!(limit_hi, vec![3000; 6]);
    }

    #[tokio::test]
    async fn test_max_only_passes_empty_low_slot() {
        let doc = doc("NOISE_TEST_LIMIT = 40\n");
        let sensor = ScriptedSensor::permissive(geometry());
        let item = resolve(TestKind::Noise, &doc, geometry(), &sensor).await;

        let execution = TestExecutor::execute(&item, geometry(), &sensor)
            .await
            .expect("dispatch");
        let Execution::Generic { limit_lo, limit_hi, .. } = execution else {
            panic!("expected generic execution");
        };
        assert!(limit_lo.is_empty());
        assert_eq!(limit_hi, vec![40; 6]);
    }

    #[tokio::test]
    async fn test_zero_data_size_never_reaches_hardware() {
        let degenerate = DeviceGeometry::new(0, 3);
        let doc = LimitsDoc::parse("NUM_OF_ROW = 0\nNUM_OF_COL = 3\nNOISE_TEST_LIMIT = 40\n", degenerate)
            .expect("parse");
        let sensor = ScriptedSensor::permissive(degenerate);
        let item = resolve(TestKind::Noise, &doc, degenerate, &sensor).await;

        let err = TestExecutor::execute(&item, degenerate, &sensor)
            .await
            .expect_err("zero data size");
        assert!(matches!(err, DispatchError::EmptyDataSize { .. }));
        assert!(sensor.dispatched().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_item_is_dispatch_error() {
        let doc = doc("");
        let sensor = ScriptedSensor::permissive(geometry());
        let item = resolve(TestKind::Noise, &doc, geometry(), &sensor).await;
        assert!(!item.has_valid_limit);

        let err = TestExecutor::execute(&item, geometry(), &sensor)
            .await
            .expect_err("missing configuration");
        assert!(matches!(err, DispatchError::MissingConfiguration { .. }));
        assert!(sensor.dispatched().is_empty());
    }

    #[tokio::test]
    async fn test_ex_trx_short_uses_dedicated_entry_point() {
        let body = "EX_TRX_SHORT_LIMIT = 5\n\
                    EX_TRX_SHORT_LIMIT_EX_PIN_1 = 2\n\
                    EX_TRX_SHORT_LIMIT_EX_PIN_2 = 3\n";
        let sensor = ScriptedSensor::permissive(geometry());
        let item = resolve(TestKind::ExTrxShort, &doc(body), geometry(), &sensor).await;

        let execution = TestExecutor::execute(&item, geometry(), &sensor)
            .await
            .expect("dispatch");
        let Execution::ExTrxShort { channel_limit, .. } = execution else {
            panic!("expected ex-trx-short execution");
        };
        assert_eq!(channel_limit, vec![5; EX_TRX_CHANNEL_COUNT]);
        assert_eq!(sensor.dispatched(), vec![TestKind::ExTrxShort]);
    }
}
