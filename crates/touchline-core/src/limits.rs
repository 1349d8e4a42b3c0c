//! Limit resolution: from limits-file keys to validated per-test items.
//!
//! Each test kind's descriptor names its keys and element-count contract;
//! resolution materializes either a broadcast scalar or a full per-element
//! array, or records a fault. Faults never abort configuration loading:
//! the item keeps running through the campaign and is reported as having an
//! invalid test limit (the plant tooling depends on this lenient behavior).

use tracing::{debug, warn};

use touchline_hal::{ChannelWindow, DeviceGeometry, SensorLink, TestKind};

use crate::catalog::{
    descriptor, LimitKeys, RX_LENGTH_KEY, RX_OFFSET_KEY, TX_LENGTH_KEY, TX_OFFSET_KEY,
};
use crate::config::LimitsDoc;
use crate::error::LimitError;

/// One resolved limit slot.
///
/// A scalar is broadcast across the result buffer at dispatch time; a
/// per-element array is used verbatim. The resolver never expands scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    Scalar(i32),
    PerElement(Vec<i32>),
}

impl Limit {
    /// Expand to `len` elements for the hardware call.
    pub fn materialize(&self, len: usize) -> Vec<i32> {
        match self {
            Limit::Scalar(value) => vec![*value; len],
            Limit::PerElement(values) => values.clone(),
        }
    }
}

/// Fully resolved configuration of one test kind.
///
/// Constructed disabled with empty limits, populated once per configuration
/// load, consumed read-only by the dispatcher. A reload builds fresh items;
/// nothing here is reused or cleared in place.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub kind: TestKind,
    pub enabled: bool,
    /// False when any required key failed to resolve; the item still runs
    /// through the campaign and reports the fault inline.
    pub has_valid_limit: bool,
    pub limit_lo: Option<Limit>,
    pub limit_hi: Option<Limit>,
    /// Per-channel limit of the PT01/PT03 short tests (no arity contract).
    pub custom_limit: Option<Vec<i32>>,
    /// Extended-pin limit pair of the extended TRx short test.
    pub ex_pin_limit: Option<[i32; 2]>,
    /// Full-frame reference of the extended high-resistance test.
    pub reference_frame: Option<Vec<i32>>,
    pub tixel_limit: Option<i32>,
    pub rx_roe_limit: Option<i32>,
    pub tx_roe_limit: Option<i32>,
    pub channel_window: Option<ChannelWindow>,
    /// Resolution faults, rendered into the item's report section.
    pub faults: Vec<String>,
}

impl TestItem {
    pub fn new(kind: TestKind) -> Self {
        Self {
            kind,
            enabled: false,
            has_valid_limit: false,
            limit_lo: None,
            limit_hi: None,
            custom_limit: None,
            ex_pin_limit: None,
            reference_frame: None,
            tixel_limit: None,
            rx_roe_limit: None,
            tx_roe_limit: None,
            channel_window: None,
            faults: Vec::new(),
        }
    }

    /// Report section header for this item.
    pub fn title(&self) -> &'static str {
        descriptor(self.kind).title
    }

    fn fault(&mut self, err: LimitError) {
        warn!(kind = %self.kind, %err, "limit resolution fault");
        self.faults.push(err.to_string());
        self.has_valid_limit = false;
    }
}

/// Resolve one test kind against a parsed limits document.
///
/// The sensor is consulted only for the per-channel short tests, whose
/// channel-assignment window must be validated against the device pin map.
pub async fn resolve(
    kind: TestKind,
    doc: &LimitsDoc,
    geometry: DeviceGeometry,
    sensor: &dyn SensorLink,
) -> TestItem {
    let desc = descriptor(kind);
    let mut item = TestItem::new(kind);
    item.has_valid_limit = true;

    match desc.keys {
        LimitKeys::MaxOnly { max } => {
            match resolve_slot(doc, max, desc.limit_arity(geometry)) {
                Ok(limit) => item.limit_hi = Some(limit),
                Err(err) => item.fault(err),
            }
        }
        LimitKeys::MinMax { min, max } => {
            let arity = desc.limit_arity(geometry);
            match resolve_slot(doc, min, arity) {
                Ok(limit) => item.limit_lo = Some(limit),
                Err(err) => item.fault(err),
            }
            match resolve_slot(doc, max, arity) {
                Ok(limit) => item.limit_hi = Some(limit),
                Err(err) => item.fault(err),
            }
        }
        LimitKeys::Channel { limit } => {
            let values = doc.values(limit);
            if values.is_empty() {
                item.fault(LimitError::Missing {
                    key: limit.to_string(),
                });
            } else {
                item.custom_limit = Some(values);
            }
            match resolve_channel_window(doc) {
                Ok(window) => match sensor.check_channel_assignment(window).await {
                    Ok(true) => item.channel_window = Some(window),
                    Ok(false) => {
                        item.custom_limit = None;
                        item.fault(LimitError::channel_assignment(window));
                    }
                    Err(err) => {
                        item.custom_limit = None;
                        item.fault(LimitError::Hal(err));
                    }
                },
                Err(err) => {
                    item.custom_limit = None;
                    item.fault(err);
                }
            }
        }
        LimitKeys::ExHighResistance {
            reference,
            tixels,
            rx_roe,
            tx_roe,
        } => {
            let frame_len = geometry.frame_len();
            let values = doc.values(reference);
            if values.len() == frame_len {
                item.reference_frame = Some(values);
            } else {
                item.fault(LimitError::Shape {
                    key: reference.to_string(),
                    found: values.len(),
                    least: frame_len,
                    most: frame_len,
                });
            }
            match required_scalar(doc, tixels) {
                Ok(value) => item.tixel_limit = Some(value),
                Err(err) => item.fault(err),
            }
            match required_scalar(doc, rx_roe) {
                Ok(value) => item.rx_roe_limit = Some(value),
                Err(err) => item.fault(err),
            }
            match required_scalar(doc, tx_roe) {
                Ok(value) => item.tx_roe_limit = Some(value),
                Err(err) => item.fault(err),
            }
        }
        LimitKeys::ExTrxShort {
            limit,
            ex_pin_1,
            ex_pin_2,
        } => {
            match resolve_slot(doc, limit, desc.limit_arity(geometry)) {
                Ok(resolved) => item.limit_lo = Some(resolved),
                Err(err) => item.fault(err),
            }
            let pin_1 = required_scalar(doc, ex_pin_1);
            let pin_2 = required_scalar(doc, ex_pin_2);
            match (pin_1, pin_2) {
                (Ok(pin_1), Ok(pin_2)) => item.ex_pin_limit = Some([pin_1, pin_2]),
                (lo, hi) => {
                    for err in [lo.err(), hi.err()].into_iter().flatten() {
                        item.fault(err);
                    }
                }
            }
        }
    }

    debug!(
        kind = %kind,
        valid = item.has_valid_limit,
        faults = item.faults.len(),
        "resolved test item"
    );
    item
}

/// Resolve every catalog kind in campaign order, marking the enabled set.
pub async fn resolve_all(
    doc: &LimitsDoc,
    geometry: DeviceGeometry,
    sensor: &dyn SensorLink,
    enabled: &[TestKind],
) -> Vec<TestItem> {
    let mut items = Vec::with_capacity(crate::catalog::CAMPAIGN_ORDER.len());
    for kind in crate::catalog::CAMPAIGN_ORDER {
        let mut item = resolve(kind, doc, geometry, sensor).await;
        item.enabled = enabled.contains(&kind);
        items.push(item);
    }
    items
}

/// Apply the element-count contract: `most` elements is a per-element
/// array, `least` (always 1) is a broadcast scalar, anything else is a
/// shape fault. An empty list means the key was absent or unparsable.
fn resolve_slot(doc: &LimitsDoc, key: &str, arity: (usize, usize)) -> Result<Limit, LimitError> {
    let (least, most) = arity;
    let values = doc.values(key);
    match values.len() {
        0 => Err(LimitError::Missing {
            key: key.to_string(),
        }),
        n if n == most && most != least => Ok(Limit::PerElement(values)),
        n if n == least => Ok(Limit::Scalar(values[0])),
        found => Err(LimitError::Shape {
            key: key.to_string(),
            found,
            least,
            most,
        }),
    }
}

fn required_scalar(doc: &LimitsDoc, key: &str) -> Result<i32, LimitError> {
    doc.scalar(key).ok_or_else(|| LimitError::Missing {
        key: key.to_string(),
    })
}

fn resolve_channel_window(doc: &LimitsDoc) -> Result<ChannelWindow, LimitError> {
    let rx_offset = channel_metadata(doc, RX_OFFSET_KEY)?;
    let rx_len = channel_metadata(doc, RX_LENGTH_KEY)?;
    let tx_offset = channel_metadata(doc, TX_OFFSET_KEY)?;
    let tx_len = channel_metadata(doc, TX_LENGTH_KEY)?;
    Ok(ChannelWindow {
        rx_offset,
        rx_len,
        tx_offset,
        tx_len,
    })
}

fn channel_metadata(doc: &LimitsDoc, key: &str) -> Result<u16, LimitError> {
    let value = doc.scalar(key).ok_or_else(|| LimitError::Missing {
        key: key.to_string(),
    })?;
    u16::try_from(value).map_err(|_| LimitError::ChannelMetadata {
        key: key.to_string(),
        value,
    })
}
