//! Per-item campaign records.

use serde::{Deserialize, Serialize};
use touchline_hal::TestKind;

/// Terminal status of one campaign item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Kernel ran and returned zero.
    Passed,
    /// Kernel ran and returned a positive diagnostic value, surfaced
    /// verbatim (e.g. a failed-frame count).
    Failed { diagnostic: i32 },
    /// Kernel could not execute (negative code or boundary failure).
    ErrorOut { message: String },
    /// Limits file did not yield a valid configuration for this item.
    InvalidLimit,
    /// Campaign abort was raised before this item started.
    Terminated,
}

impl TestStatus {
    /// Whether this status counts as a pass in the campaign aggregate.
    pub fn passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

/// Result of one executed (or skipped) campaign item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// Test kind.
    pub kind: TestKind,

    /// Report section header.
    pub title: String,

    /// Terminal status.
    pub status: TestStatus,

    /// Rendered report section, including data and limits.
    pub section: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl TestRecord {
    /// Whether this item passed.
    pub fn passed(&self) -> bool {
        self.status.passed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_zero_code_status_passes() {
        assert!(TestStatus::Passed.passed());
        assert!(!TestStatus::Failed { diagnostic: 5 }.passed());
        assert!(!TestStatus::ErrorOut {
            message: "amp open".to_string()
        }
        .passed());
        assert!(!TestStatus::InvalidLimit.passed());
        assert!(!TestStatus::Terminated.passed());
    }
}
