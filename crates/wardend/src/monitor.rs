//! The monitor loop.
//!
//! Two entry points, one dispatcher:
//! - `report_outcome` is called by whatever executes integration work
//!   and feeds the health tracker in real time; crossing the escalation
//!   threshold raises a `HealthThreshold` remediation.
//! - the periodic scan fetches each active integration's live spec,
//!   diffs it against the stored baseline, and raises a `DriftScan`
//!   remediation on breaking drift.
//!
//! A failure for one integration never aborts the cycle, and nothing in
//! here can take down the host process: every external call is
//! time-bounded and every error path degrades to a log line.

use crate::config::WardenConfig;
use crate::dispatcher::RemediationDispatcher;
use crate::fetcher::SpecSource;
use crate::registry::{IntegrationRecord, IntegrationRegistry};
use crate::tracker::HealthTracker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warden_common::{
    classify, diff, DriftReport, HealthSnapshot, RemediationRequest, TriggerSource,
};

/// Fleet-wide view for inspection surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetHealth {
    /// Integration id -> current health score.
    pub scores: HashMap<String, f64>,
    /// Integrations below the critical score threshold.
    pub critical_ids: Vec<String>,
}

pub struct Monitor {
    registry: Arc<dyn IntegrationRegistry>,
    source: Arc<dyn SpecSource>,
    tracker: HealthTracker,
    dispatcher: RemediationDispatcher,
    config: WardenConfig,
    last_drift: RwLock<HashMap<String, DriftReport>>,
}

impl Monitor {
    pub fn new(
        registry: Arc<dyn IntegrationRegistry>,
        source: Arc<dyn SpecSource>,
        tracker: HealthTracker,
        dispatcher: RemediationDispatcher,
        config: WardenConfig,
    ) -> Self {
        Self {
            registry,
            source,
            tracker,
            dispatcher,
            config,
            last_drift: RwLock::new(HashMap::new()),
        }
    }

    /// Spawn the periodic drift-scan task. Runs until the handle is
    /// aborted or the process exits.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = self.clone();
        let period = monitor.config.scan_interval();
        info!(interval_secs = period.as_secs(), "Starting drift scan loop");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                monitor.run_scan_cycle().await;
            }
        })
    }

    /// One full drift-scan pass over the active fleet.
    pub async fn run_scan_cycle(&self) {
        let active = self.registry.list_active().await;
        debug!(count = active.len(), "Drift scan cycle starting");

        for record in &active {
            self.scan_integration(record).await;
        }

        debug!("Drift scan cycle complete");
    }

    async fn scan_integration(&self, record: &IntegrationRecord) {
        let Some(url) = record.live_spec_url.as_deref() else {
            debug!(integration_id = %record.id, "No live spec URL, skipping scan");
            return;
        };

        // soft failure: log, skip this integration until the next tick
        let live = match self.source.fetch(url).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(integration_id = %record.id, error = %e, "Live spec fetch failed, skipping");
                return;
            }
        };

        let report = classify(&diff(&record.baseline, &live));

        if !report.changes.is_empty() {
            info!(
                integration_id = %record.id,
                drift_type = ?report.drift_type,
                severity = ?report.severity,
                changes = report.changes.len(),
                "Drift detected"
            );
        }

        let breaking = report.is_breaking();
        let reason = drift_reason(&report);
        self.last_drift
            .write()
            .await
            .insert(record.id.clone(), report);

        if breaking {
            self.escalate(&record.id, &reason, TriggerSource::DriftScan)
                .await;
        }
    }

    /// Event-driven path: record one execution outcome, escalating when
    /// the failure rate crosses the critical threshold.
    pub async fn report_outcome(
        &self,
        integration_id: &str,
        success: bool,
        duration_ms: Option<u64>,
        error: Option<&str>,
    ) -> HealthSnapshot {
        debug!(integration_id, success, duration_ms, "Outcome reported");

        let report = self
            .tracker
            .record_outcome(integration_id, success, error)
            .await;

        if report.should_escalate {
            let reason = error
                .map(str::to_string)
                .or_else(|| report.snapshot.recent_errors.last().cloned())
                .unwrap_or_else(|| "repeated failures with no recorded reason".to_string());
            self.escalate(integration_id, &reason, TriggerSource::HealthThreshold)
                .await;
        }

        report.snapshot
    }

    async fn escalate(&self, integration_id: &str, reason: &str, source: TriggerSource) {
        let request = RemediationRequest::from_reason(integration_id, reason, source);
        let outcome = self.dispatcher.dispatch(&request).await;
        info!(
            integration_id,
            category = ?request.issue_category,
            strategy = ?request.strategy,
            recovered = outcome.recovered,
            action = %outcome.action,
            "Remediation outcome"
        );
    }

    // Inspection surface.

    pub async fn get_integration_health(&self, integration_id: &str) -> Option<HealthSnapshot> {
        self.tracker.get_health(integration_id).await
    }

    pub async fn list_all_health(&self) -> FleetHealth {
        FleetHealth {
            scores: self.tracker.list_health().await,
            critical_ids: self.tracker.critical_ids().await,
        }
    }

    pub async fn get_last_drift_report(&self, integration_id: &str) -> Option<DriftReport> {
        self.last_drift.read().await.get(integration_id).cloned()
    }
}

/// Build the diagnosis input from a drift report. Endpoint removals
/// phrase the reason as a missing endpoint so the rule table routes
/// them to reingest+remap; other breaking edits read as schema drift
/// and route to remap.
fn drift_reason(report: &DriftReport) -> String {
    if let Some(removal) = report.endpoint_removal() {
        format!("endpoint not found in live spec: {removal}")
    } else {
        let dominant = report.dominant_change().unwrap_or("structural change");
        format!("schema drift detected: {dominant}")
    }
}
