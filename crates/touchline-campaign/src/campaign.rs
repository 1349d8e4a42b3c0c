//! Campaign orchestration: run the enabled items in fixed order and
//! aggregate a single verdict.
//!
//! The campaign body is designed to run on a dedicated worker task; the
//! consumer owns the receiving half of the event channel and the abort
//! flag. The abort flag is read once per item boundary; an item already
//! handed to the hardware cannot be interrupted, and aborting records the
//! remaining items as terminated without exiting the loop early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use touchline_core::TestItem;
use touchline_hal::{DeviceGeometry, SensorLink, TestKind};

use crate::dispatch::{classify, ResultClass, TestExecutor};
use crate::format;
use crate::record::{TestRecord, TestStatus};

/// Campaign lifecycle. Transitions are one-way: Idle → Running → Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignState {
    Idle,
    Running,
    Completed,
}

/// Progress events marshaled to the consumer thread. Write-only from the
/// worker's perspective; a dropped receiver never stalls the campaign.
#[derive(Debug, Clone)]
pub enum CampaignEvent {
    Started { campaign_id: String, items: usize },
    ItemStarted { kind: TestKind },
    ItemFinished { kind: TestKind, passed: bool },
    Finished { passed: bool },
}

/// Result of one complete campaign execution.
#[derive(Debug, Clone)]
pub struct CampaignResult {
    /// Campaign ID.
    pub campaign_id: String,

    /// Whether every enabled item passed.
    pub passed: bool,

    /// Per-item records, in execution order (enabled items only).
    pub records: Vec<TestRecord>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl CampaignResult {
    /// Number of items that passed.
    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    /// Number of items that failed, errored out, or were terminated.
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.passed()).count()
    }
}

/// Campaign orchestrator over a resolved item set.
pub struct Campaign {
    geometry: DeviceGeometry,
    items: Vec<TestItem>,
    abort: Arc<AtomicBool>,
    events: Option<mpsc::UnboundedSender<CampaignEvent>>,
    state: CampaignState,
}

impl Campaign {
    pub fn new(geometry: DeviceGeometry, items: Vec<TestItem>) -> Self {
        Self {
            geometry,
            items,
            abort: Arc::new(AtomicBool::new(false)),
            events: None,
            state: CampaignState::Idle,
        }
    }

    /// Handle to the shared abort flag. Raising it prevents every item
    /// that has not yet started; it never interrupts a running kernel.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Attach a progress-event channel.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<CampaignEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> CampaignState {
        self.state
    }

    fn emit(&self, event: CampaignEvent) {
        if let Some(events) = &self.events {
            // The consumer may have gone away; the campaign does not care.
            let _ = events.send(event);
        }
    }

    /// Execute the campaign. Consumes the orchestrator: a new campaign is
    /// built from freshly resolved items, never by reusing this one.
    pub async fn run(mut self, sensor: Arc<dyn SensorLink>) -> CampaignResult {
        let campaign_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();
        self.state = CampaignState::Running;

        let enabled: Vec<&TestItem> = self.items.iter().filter(|i| i.enabled).collect();
        info!(
            campaign_id = %campaign_id,
            enabled = enabled.len(),
            "starting test campaign"
        );
        self.emit(CampaignEvent::Started {
            campaign_id: campaign_id.clone(),
            items: enabled.len(),
        });

        let mut records = Vec::with_capacity(enabled.len());
        let mut all_passed = true;

        for item in &self.items {
            if !item.enabled {
                continue;
            }

            // Coarse-grained cooperative cancellation: checked once per
            // item boundary, and the loop still visits every item so each
            // gets a terminated record.
            if self.abort.load(Ordering::SeqCst) {
                warn!(kind = %item.kind, "campaign aborted; item terminated");
                records.push(TestRecord {
                    kind: item.kind,
                    title: item.title().to_string(),
                    status: TestStatus::Terminated,
                    section: format::render_terminated(item.title()),
                    duration_ms: 0,
                });
                all_passed = false;
                continue;
            }

            if !item.has_valid_limit {
                warn!(kind = %item.kind, "invalid test limit; item not dispatched");
                records.push(TestRecord {
                    kind: item.kind,
                    title: item.title().to_string(),
                    status: TestStatus::InvalidLimit,
                    section: format::render_invalid(item),
                    duration_ms: 0,
                });
                all_passed = false;
                continue;
            }

            self.emit(CampaignEvent::ItemStarted { kind: item.kind });
            let item_start = Instant::now();

            let record = match TestExecutor::execute(item, self.geometry, sensor.as_ref()).await {
                Err(err) => {
                    // Dispatch failures never produce data; record an
                    // error-only section and keep going.
                    let message = err.to_string();
                    TestRecord {
                        kind: item.kind,
                        title: item.title().to_string(),
                        status: TestStatus::ErrorOut {
                            message: message.clone(),
                        },
                        section: format::render_error(item.title(), &message),
                        duration_ms: item_start.elapsed().as_millis() as u64,
                    }
                }
                Ok(execution) => match classify(execution.code()) {
                    ResultClass::ErrorOut => {
                        let message = sensor.error_message().await;
                        TestRecord {
                            kind: item.kind,
                            title: item.title().to_string(),
                            status: TestStatus::ErrorOut {
                                message: message.clone(),
                            },
                            section: format::render_error(item.title(), &message),
                            duration_ms: item_start.elapsed().as_millis() as u64,
                        }
                    }
                    ResultClass::Pass => {
                        let mut section =
                            format::render_section(item, self.geometry, &execution);
                        section.push_str("Result = PASS\n");
                        TestRecord {
                            kind: item.kind,
                            title: item.title().to_string(),
                            status: TestStatus::Passed,
                            section,
                            duration_ms: item_start.elapsed().as_millis() as u64,
                        }
                    }
                    ResultClass::Fail(diagnostic) => {
                        let mut section =
                            format::render_section(item, self.geometry, &execution);
                        section.push_str(&format!("Result = FAIL ({diagnostic})\n"));
                        TestRecord {
                            kind: item.kind,
                            title: item.title().to_string(),
                            status: TestStatus::Failed { diagnostic },
                            section,
                            duration_ms: item_start.elapsed().as_millis() as u64,
                        }
                    }
                },
            };

            if !record.passed() {
                all_passed = false;
            }
            self.emit(CampaignEvent::ItemFinished {
                kind: item.kind,
                passed: record.passed(),
            });
            records.push(record);
        }

        self.state = CampaignState::Completed;
        let duration_ms = start.elapsed().as_millis() as u64;
        if all_passed {
            info!(campaign_id = %campaign_id, duration_ms, "campaign passed");
        } else {
            info!(campaign_id = %campaign_id, duration_ms, "campaign failed");
        }
        self.emit(CampaignEvent::Finished { passed: all_passed });

        CampaignResult {
            campaign_id,
            passed: all_passed,
            records,
            duration_ms,
        }
    }
}
