//! Touchline Campaign - test execution and reporting
//!
//! Provides the campaign layer of the Touchline test engine:
//! - Dispatches resolved test items to the sensor boundary
//! - Renders per-item report sections (frame / profile / pin layouts)
//! - Orchestrates the enabled set in fixed order with cooperative abort
//! - Produces the plant text report and a machine-readable summary

pub mod campaign;
pub mod dispatch;
pub mod format;
pub mod plan;
pub mod record;
pub mod report;

// Re-export key types
pub use campaign::{Campaign, CampaignEvent, CampaignResult, CampaignState};
pub use dispatch::{classify, DispatchError, Execution, ResultClass, TestExecutor};
pub use format::{render_error, render_invalid, render_section, render_terminated};
pub use plan::{CampaignPlan, PlanError};
pub use record::{TestRecord, TestStatus};
pub use report::{render_report, write_summary_json, CampaignSummary, RecordSummary};
