//! Campaign plan file.
//!
//! A plan names the campaign, points at the plant limits file and selects
//! the enabled test kinds. Execution order is never taken from the plan:
//! the catalog's fixed campaign order always wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use touchline_core::CAMPAIGN_ORDER;
use touchline_hal::TestKind;

/// Plan loading errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan file unreadable: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plan file invalid: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("limits file must end in .ini: {path}")]
    LimitsExtension { path: PathBuf },
}

/// Configuration for one test campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPlan {
    /// Human-readable campaign name (e.g. the line/station label).
    pub name: String,

    /// Path to the plant limits file.
    pub limits_file: PathBuf,

    /// Enabled test kinds. Defaults to the full catalog.
    #[serde(default = "full_catalog")]
    pub tests: Vec<TestKind>,
}

fn full_catalog() -> Vec<TestKind> {
    CAMPAIGN_ORDER.to_vec()
}

impl CampaignPlan {
    /// Plan enabling every catalog test.
    pub fn all_tests(name: impl Into<String>, limits_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            limits_file: limits_file.into(),
            tests: full_catalog(),
        }
    }

    /// Load a plan from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a plan from TOML text.
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(text)?)
    }

    /// Validate the plan preconditions the engine relies on.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.limits_file.extension().and_then(|e| e.to_str()) != Some("ini") {
            return Err(PlanError::LimitsExtension {
                path: self.limits_file.clone(),
            });
        }
        Ok(())
    }

    /// Enabled kinds, deduplicated, in catalog campaign order.
    pub fn enabled(&self) -> Vec<TestKind> {
        CAMPAIGN_ORDER
            .into_iter()
            .filter(|kind| self.tests.contains(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_plan_enables_everything() {
        let plan = CampaignPlan::parse(
            r#"
name = "EOL line 3"
limits_file = "limits/p7500.ini"
"#,
        )
        .expect("parse");
        assert_eq!(plan.name, "EOL line 3");
        assert_eq!(plan.enabled().len(), CAMPAIGN_ORDER.len());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_selected_tests_follow_campaign_order() {
        let plan = CampaignPlan::parse(
            r#"
name = "bringup"
limits_file = "bringup.ini"
tests = ["ex_trx_short", "noise", "noise"]
"#,
        )
        .expect("parse");
        // Plan order and duplicates are ignored; catalog order wins.
        assert_eq!(
            plan.enabled(),
            vec![TestKind::Noise, TestKind::ExTrxShort]
        );
    }

    #[test]
    fn test_unknown_test_name_is_rejected() {
        let err = CampaignPlan::parse(
            r#"
name = "bad"
limits_file = "x.ini"
tests = ["noise", "warp_field"]
"#,
        )
        .expect_err("unknown kind");
        assert!(matches!(err, PlanError::Parse(_)));
    }

    #[test]
    fn test_limits_extension_validated() {
        let plan = CampaignPlan::all_tests("x", "limits.txt");
        assert!(matches!(
            plan.validate(),
            Err(PlanError::LimitsExtension { .. })
        ));
    }

    #[test]
    fn test_plan_round_trips_through_toml() {
        let plan = CampaignPlan {
            name: "station 7".to_string(),
            limits_file: PathBuf::from("p7500.ini"),
            tests: vec![TestKind::Noise, TestKind::AbsRawPt12],
        };
        let text = toml::to_string(&plan).expect("serialize");
        let parsed = CampaignPlan::parse(&text).expect("parse");
        assert_eq!(parsed, plan);
    }
}
