// ABOUTME: Reporting boundary: structured events and the sink trait.
// ABOUTME: The core hands over locale-agnostic data; sinks own presentation.

use crate::update::{BatchResult, Orchestrator, StaleContainer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One `(name, old, new)` image tuple in an update or monitor event.
#[derive(Debug, Clone, Serialize)]
pub struct ImageChange {
    pub name: String,
    pub old_image: String,
    pub new_image: String,
}

/// A structured notification handed to the reporting boundary.
///
/// Events carry data only; formatting and localization belong to the sink.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReportEvent {
    /// The process came up.
    Startup {
        host: String,
        endpoints: Vec<String>,
        next_run: Option<DateTime<Utc>>,
    },
    /// A detection-only pass found stale containers.
    MonitorDetected {
        host: String,
        endpoint: String,
        monitored: usize,
        total_updated: u64,
        containers: Vec<ImageChange>,
    },
    /// A pass replaced containers.
    UpdateCompleted {
        host: String,
        endpoint: String,
        monitored: usize,
        total_updated: u64,
        containers: Vec<ImageChange>,
    },
}

impl ReportEvent {
    /// Build an update-completed event from a finished pass, reading the
    /// counters the orchestrator owns.
    pub fn update_completed(
        host: &str,
        endpoint: &str,
        orchestrator: &Orchestrator,
        batch: &BatchResult,
    ) -> Self {
        ReportEvent::UpdateCompleted {
            host: host.to_string(),
            endpoint: endpoint.to_string(),
            monitored: orchestrator.monitored(endpoint),
            total_updated: orchestrator.total_updated(endpoint),
            containers: batch
                .updated
                .iter()
                .map(|u| ImageChange {
                    name: u.name.clone(),
                    old_image: u.old_image.short().to_string(),
                    new_image: u.new_image.short().to_string(),
                })
                .collect(),
        }
    }

    /// Build a monitor-detected event from a detection-only pass.
    pub fn monitor_detected(
        host: &str,
        endpoint: &str,
        monitored: usize,
        total_updated: u64,
        stale: &[StaleContainer],
    ) -> Self {
        ReportEvent::MonitorDetected {
            host: host.to_string(),
            endpoint: endpoint.to_string(),
            monitored,
            total_updated,
            containers: stale
                .iter()
                .map(|s| ImageChange {
                    name: s.name.clone(),
                    old_image: s.current.short().to_string(),
                    new_image: s.latest.short().to_string(),
                })
                .collect(),
        }
    }
}

/// Destination for report events.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(&self, event: &ReportEvent);
}

/// Sink that emits each event as one structured log line.
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn send(&self, event: &ReportEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(target: "molt::report", event = %json),
            Err(error) => tracing::warn!(%error, "failed to serialize report event"),
        }
    }
}
