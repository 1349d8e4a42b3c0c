//! Test catalog: the closed set of production test kinds and their
//! per-kind contracts.
//!
//! Every test kind carries a static descriptor naming its limits-file keys,
//! its data layout (which fixes buffer sizes and the report rendering), and
//! which limit slots apply. The dispatcher and resolver are both driven off
//! this table, so adding a kind is a compile-enforced, single-site change.

use touchline_hal::{DeviceGeometry, TestKind, PIN_BYTES};

/// Per-channel limit arity of the extended TRx short kernel.
pub const EX_TRX_CHANNEL_COUNT: usize = 55;

/// Channel-assignment metadata keys shared by the per-channel short tests.
pub const RX_OFFSET_KEY: &str = "TCM_CONFIG_IMAGE_RXES_OFFSET";
pub const RX_LENGTH_KEY: &str = "TCM_CONFIG_IMAGE_RXES_LENGTH";
pub const TX_OFFSET_KEY: &str = "TCM_CONFIG_IMAGE_TXES_OFFSET";
pub const TX_LENGTH_KEY: &str = "TCM_CONFIG_IMAGE_TXES_LENGTH";

/// Geometry of one test's result buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    /// One full `rows * cols` frame snapshot.
    Frame,
    /// Per-row then per-column aggregates, `rows + cols` elements.
    Profile,
    /// Raw pin-short bytes, fixed by the controller protocol.
    Pins,
}

impl DataLayout {
    /// Result buffer length for a device geometry.
    pub fn data_len(&self, geometry: DeviceGeometry) -> usize {
        match self {
            DataLayout::Frame => geometry.frame_len(),
            DataLayout::Profile => geometry.profile_len(),
            DataLayout::Pins => PIN_BYTES,
        }
    }
}

/// Which limits-file keys feed a test kind, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKeys {
    /// Single upper-bound key, element contract (1, data_len).
    MaxOnly { max: &'static str },
    /// Lower/upper key pair, each with element contract (1, data_len).
    MinMax {
        min: &'static str,
        max: &'static str,
    },
    /// Per-channel custom key with no element-count contract, gated by the
    /// channel-assignment metadata and the device's pin map.
    Channel { limit: &'static str },
    /// Full-frame reference plus three independent scalar thresholds.
    ExHighResistance {
        reference: &'static str,
        tixels: &'static str,
        rx_roe: &'static str,
        tx_roe: &'static str,
    },
    /// Per-channel limit with contract (1, EX_TRX_CHANNEL_COUNT) plus the
    /// two extended-pin scalar keys.
    ExTrxShort {
        limit: &'static str,
        ex_pin_1: &'static str,
        ex_pin_2: &'static str,
    },
}

/// Static description of one test kind.
#[derive(Debug, Clone, Copy)]
pub struct TestDescriptor {
    pub kind: TestKind,
    /// Report section header.
    pub title: &'static str,
    pub layout: DataLayout,
    pub keys: LimitKeys,
}

impl TestDescriptor {
    /// Element-count contract for the kind's generic limit slots:
    /// a 1-element list is a broadcast scalar, a `most`-element list is a
    /// full per-element array, anything else is a shape error.
    pub fn limit_arity(&self, geometry: DeviceGeometry) -> (usize, usize) {
        match self.keys {
            LimitKeys::ExTrxShort { .. } => (1, EX_TRX_CHANNEL_COUNT),
            _ => (1, self.layout.data_len(geometry)),
        }
    }
}

/// Fixed campaign execution order.
pub const CAMPAIGN_ORDER: [TestKind; 11] = [
    TestKind::Noise,
    TestKind::FullRawCap,
    TestKind::DynamicRange,
    TestKind::FullRawPt05,
    TestKind::TrxTrxShortPt01,
    TestKind::TrxGroundPt03,
    TestKind::AdcRangePt11,
    TestKind::AbsRawPt12,
    TestKind::AbsNoisePt1d,
    TestKind::ExHighResistance,
    TestKind::ExTrxShort,
];

/// Descriptor lookup; exhaustive over the closed kind set.
pub fn descriptor(kind: TestKind) -> TestDescriptor {
    match kind {
        TestKind::Noise => TestDescriptor {
            kind,
            title: "Noise Test",
            layout: DataLayout::Frame,
            keys: LimitKeys::MaxOnly {
                max: "NOISE_TEST_LIMIT",
            },
        },
        TestKind::FullRawCap => TestDescriptor {
            kind,
            title: "Full Raw Capacitance Test",
            layout: DataLayout::Frame,
            keys: LimitKeys::MinMax {
                min: "FULL_RAW_CAP_LIMIT_MIN",
                max: "FULL_RAW_CAP_LIMIT_MAX",
            },
        },
        TestKind::DynamicRange => TestDescriptor {
            kind,
            title: "Dynamic Range Test",
            layout: DataLayout::Frame,
            keys: LimitKeys::MinMax {
                min: "DRT_TEST_LIMIT_MIN",
                max: "DRT_TEST_LIMIT_MAX",
            },
        },
        TestKind::FullRawPt05 => TestDescriptor {
            kind,
            title: "Full Raw PT05",
            layout: DataLayout::Frame,
            keys: LimitKeys::MinMax {
                min: "FULLRAW_PT05_LIMIT_MIN",
                max: "FULLRAW_PT05_LIMIT_MAX",
            },
        },
        TestKind::TrxTrxShortPt01 => TestDescriptor {
            kind,
            title: "TRx-TRx Short PT01",
            layout: DataLayout::Pins,
            keys: LimitKeys::Channel {
                limit: "TRX_TRX_SHORT_PT01_LIMIT",
            },
        },
        TestKind::TrxGroundPt03 => TestDescriptor {
            kind,
            title: "TRx-Ground Short PT03",
            layout: DataLayout::Pins,
            keys: LimitKeys::Channel {
                limit: "TRX_GROUND_PT03_LIMIT",
            },
        },
        TestKind::AdcRangePt11 => TestDescriptor {
            kind,
            title: "ADC Range PT11",
            layout: DataLayout::Frame,
            keys: LimitKeys::MinMax {
                min: "ADC_RANGE_PT11_LIMIT_MIN",
                max: "ADC_RANGE_PT11_LIMIT_MAX",
            },
        },
        TestKind::AbsRawPt12 => TestDescriptor {
            kind,
            title: "Abs Raw PT12",
            layout: DataLayout::Profile,
            keys: LimitKeys::MinMax {
                min: "ABS_RAW_PT12_LIMIT_MIN",
                max: "ABS_RAW_PT12_LIMIT_MAX",
            },
        },
        TestKind::AbsNoisePt1d => TestDescriptor {
            kind,
            title: "Abs Noise PT1D",
            layout: DataLayout::Profile,
            keys: LimitKeys::MinMax {
                min: "ABS_NOISE_PT1D_LIMIT_MIN",
                max: "ABS_NOISE_PT1D_LIMIT_MAX",
            },
        },
        TestKind::ExHighResistance => TestDescriptor {
            kind,
            title: "Extended High Resistance",
            layout: DataLayout::Frame,
            keys: LimitKeys::ExHighResistance {
                reference: "EX_HIGH_RESISTANCE_REF",
                tixels: "EX_HIGH_RESISTANCE_LIMIT_TIXELS",
                rx_roe: "EX_HIGH_RESISTANCE_LIMIT_RX_ROE",
                tx_roe: "EX_HIGH_RESISTANCE_LIMIT_TX_ROE",
            },
        },
        TestKind::ExTrxShort => TestDescriptor {
            kind,
            title: "Extended TRx Short",
            layout: DataLayout::Pins,
            keys: LimitKeys::ExTrxShort {
                limit: "EX_TRX_SHORT_LIMIT",
                ex_pin_1: "EX_TRX_SHORT_LIMIT_EX_PIN_1",
                ex_pin_2: "EX_TRX_SHORT_LIMIT_EX_PIN_2",
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_order_covers_every_kind_once() {
        let mut kinds = CAMPAIGN_ORDER.to_vec();
        kinds.sort_by_key(|k| k.code());
        kinds.dedup();
        assert_eq!(kinds.len(), CAMPAIGN_ORDER.len());
    }

    #[test]
    fn test_frame_and_profile_arity() {
        let geometry = DeviceGeometry::new(18, 32);
        let noise = descriptor(TestKind::Noise);
        assert_eq!(noise.limit_arity(geometry), (1, 576));

        let abs = descriptor(TestKind::AbsRawPt12);
        assert_eq!(abs.limit_arity(geometry), (1, 50));
        assert_eq!(abs.layout.data_len(geometry), 50);
    }

    #[test]
    fn test_pin_layout_is_fixed_size() {
        let geometry = DeviceGeometry::new(18, 32);
        let pt01 = descriptor(TestKind::TrxTrxShortPt01);
        assert_eq!(pt01.layout.data_len(geometry), PIN_BYTES);
    }

    #[test]
    fn test_ex_trx_short_channel_arity() {
        let geometry = DeviceGeometry::new(18, 32);
        let ex = descriptor(TestKind::ExTrxShort);
        assert_eq!(ex.limit_arity(geometry), (1, EX_TRX_CHANNEL_COUNT));
    }

    #[test]
    fn test_descriptor_kind_matches_lookup() {
        for kind in CAMPAIGN_ORDER {
            assert_eq!(descriptor(kind).kind, kind);
        }
    }
}
