//! Campaign report artifacts.
//!
//! Two output artifacts for line consumers:
//! - `CampaignSummary`: machine-readable aggregate outcome (summary.json)
//! - the plant text report: one section per executed item plus a verdict
//!   footer, assembled from the sections the formatter rendered.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use touchline_core::LimitsDigest;
use touchline_hal::DeviceGeometry;

use crate::campaign::CampaignResult;
use crate::record::{TestRecord, TestStatus};

/// Aggregate campaign outcome for line tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub name: String,
    /// SHA-256 of the raw limits file the campaign was judged against.
    pub limits_digest: String,
    pub geometry: DeviceGeometry,
    pub run_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub verdict: bool,
    pub records: Vec<RecordSummary>,
}

/// Per-item outcome in the machine-readable summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub test: String,
    pub status: TestStatus,
    pub duration_ms: u64,
}

impl CampaignSummary {
    /// Build a summary from a finished campaign.
    pub fn new(
        name: &str,
        limits_digest: &LimitsDigest,
        geometry: DeviceGeometry,
        result: &CampaignResult,
    ) -> Self {
        let total = result.records.len();
        let passed = result.passed_count();
        Self {
            campaign_id: result.campaign_id.clone(),
            name: name.to_string(),
            limits_digest: limits_digest.as_str().to_string(),
            geometry,
            run_at: Utc::now(),
            duration_ms: result.duration_ms,
            total,
            passed,
            failed: total - passed,
            verdict: result.passed,
            records: result
                .records
                .iter()
                .map(|record| RecordSummary {
                    test: record.kind.name().to_string(),
                    status: record.status.clone(),
                    duration_ms: record.duration_ms,
                })
                .collect(),
        }
    }
}

/// Render the plant text report from the summary and the item sections.
pub fn render_report(summary: &CampaignSummary, records: &[TestRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Touchline campaign report: {}\n", summary.name));
    out.push_str(&format!("campaign:  {}\n", summary.campaign_id));
    out.push_str(&format!("limits:    {}\n", summary.limits_digest));
    out.push_str(&format!("device:    {}\n", summary.geometry));
    out.push_str(&format!("run at:    {}\n", summary.run_at.to_rfc3339()));

    for record in records {
        out.push_str("\n----------------------------------------\n");
        out.push_str(&record.section);
    }

    out.push_str("\n========================================\n");
    out.push_str(&format!(
        "{} of {} tests passed\n",
        summary.passed, summary.total
    ));
    out.push_str(if summary.verdict {
        "verdict: PASS\n"
    } else {
        "verdict: FAIL\n"
    });
    out
}

/// Write the machine-readable summary as pretty-printed JSON.
pub fn write_summary_json(path: impl AsRef<Path>, summary: &CampaignSummary) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchline_hal::TestKind;

    fn result() -> CampaignResult {
        CampaignResult {
            campaign_id: "c-123".to_string(),
            passed: false,
            records: vec![
                TestRecord {
                    kind: TestKind::Noise,
                    title: "Noise Test".to_string(),
                    status: TestStatus::Passed,
                    section: "Noise Test\nResult = PASS\n".to_string(),
                    duration_ms: 12,
                },
                TestRecord {
                    kind: TestKind::FullRawCap,
                    title: "Full Raw Capacitance Test".to_string(),
                    status: TestStatus::Failed { diagnostic: 3 },
                    section: "Full Raw Capacitance Test\nResult = FAIL (3)\n".to_string(),
                    duration_ms: 20,
                },
            ],
            duration_ms: 40,
        }
    }

    fn summary(result: &CampaignResult) -> CampaignSummary {
        CampaignSummary::new(
            "EOL line 3",
            &LimitsDigest::from_bytes(b"NUM_OF_ROW=2\n"),
            DeviceGeometry::new(2, 3),
            result,
        )
    }

    #[test]
    fn test_summary_counts() {
        let result = result();
        let summary = summary(&result);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.verdict);
        assert_eq!(summary.records.len(), 2);
    }

    #[test]
    fn test_report_contains_sections_and_verdict() {
        let result = result();
        let summary = summary(&result);
        let report = render_report(&summary, &result.records);
        assert!(report.contains("Touchline campaign report: EOL line 3"));
        assert!(report.contains("Noise Test"));
        assert!(report.contains("Result = FAIL (3)"));
        assert!(report.contains("1 of 2 tests passed"));
        assert!(report.contains("verdict: FAIL"));
    }

    #[test]
    fn test_summary_json_round_trip() {
        let result = result();
        let summary = summary(&result);
        let json = serde_json::to_string(&summary).expect("serialize");
        let parsed: CampaignSummary = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.campaign_id, summary.campaign_id);
        assert_eq!(parsed.total, 2);
    }
}
