//! Concurrent health store.
//!
//! Shared mutable state done the boring way: an outer read-write lock
//! over the id map, a per-integration mutex inside. Reports for
//! different integrations only contend on the map lock; reports for the
//! same integration serialize their read-modify-write, so counters and
//! the error FIFO stay consistent under concurrent callers.

use crate::config::EscalationConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use warden_common::{HealthSnapshot, IntegrationHealth};

/// Result of recording one outcome.
#[derive(Debug, Clone)]
pub struct OutcomeReport {
    pub snapshot: HealthSnapshot,
    /// Failure rate crossed the critical threshold with enough samples.
    pub should_escalate: bool,
}

pub struct HealthTracker {
    records: RwLock<HashMap<String, Arc<Mutex<IntegrationHealth>>>>,
    escalation: EscalationConfig,
}

impl HealthTracker {
    pub fn new(escalation: EscalationConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            escalation,
        }
    }

    /// Record one execution outcome. Creates the record lazily on first
    /// report for an unseen integration.
    pub async fn record_outcome(
        &self,
        integration_id: &str,
        success: bool,
        error: Option<&str>,
    ) -> OutcomeReport {
        let record = self.entry(integration_id).await;
        let mut health = record.lock().await;

        if success {
            health.record_success();
        } else {
            health.record_failure(error);
        }

        let snapshot = health.snapshot();
        let should_escalate = health.failure_rate() > self.escalation.critical_failure_rate
            && health.total_calls() > self.escalation.min_sample;

        OutcomeReport {
            snapshot,
            should_escalate,
        }
    }

    /// Snapshot for one integration; `None` for an unknown id.
    pub async fn get_health(&self, integration_id: &str) -> Option<HealthSnapshot> {
        let records = self.records.read().await;
        let record = records.get(integration_id)?.clone();
        drop(records);
        let health = record.lock().await;
        Some(health.snapshot())
    }

    /// Current score per integration.
    pub async fn list_health(&self) -> HashMap<String, f64> {
        let records = self.records.read().await;
        let entries: Vec<(String, Arc<Mutex<IntegrationHealth>>)> = records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        drop(records);

        let mut scores = HashMap::with_capacity(entries.len());
        for (id, record) in entries {
            let health = record.lock().await;
            scores.insert(id, health.health_score());
        }
        scores
    }

    /// Integrations whose score is below the critical threshold.
    pub async fn critical_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .list_health()
            .await
            .into_iter()
            .filter(|(_, score)| *score < self.escalation.critical_score)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Administrative counter reset. Nothing in the monitor calls this.
    pub async fn reset(&self, integration_id: &str) {
        let records = self.records.read().await;
        if let Some(record) = records.get(integration_id) {
            let record = record.clone();
            drop(records);
            let mut health = record.lock().await;
            *health = IntegrationHealth::new(integration_id);
        }
    }

    async fn entry(&self, integration_id: &str) -> Arc<Mutex<IntegrationHealth>> {
        {
            let records = self.records.read().await;
            if let Some(record) = records.get(integration_id) {
                return record.clone();
            }
        }
        let mut records = self.records.write().await;
        records
            .entry(integration_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(IntegrationHealth::new(integration_id))))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> HealthTracker {
        HealthTracker::new(EscalationConfig::default())
    }

    #[tokio::test]
    async fn test_lazy_creation_on_first_report() {
        let tracker = tracker();
        assert!(tracker.get_health("int-1").await.is_none());

        let report = tracker.record_outcome("int-1", true, None).await;
        assert_eq!(report.snapshot.total_calls, 1);
        assert!(tracker.get_health("int-1").await.is_some());
    }

    #[tokio::test]
    async fn test_single_early_failure_never_escalates() {
        let tracker = tracker();
        let report = tracker
            .record_outcome("int-1", false, Some("401 Unauthorized"))
            .await;
        // rate 1.0 > 0.5 but only 1 call: the sample guard holds
        assert!(!report.should_escalate);
    }

    #[tokio::test]
    async fn test_escalates_past_sample_guard() {
        let tracker = tracker();
        for _ in 0..4 {
            tracker.record_outcome("int-1", true, None).await;
        }
        let mut last = None;
        for _ in 0..6 {
            last = Some(
                tracker
                    .record_outcome("int-1", false, Some("500 error"))
                    .await,
            );
        }
        let report = last.unwrap();
        assert_eq!(report.snapshot.total_calls, 10);
        assert_eq!(report.snapshot.failed_calls, 6);
        assert!(report.should_escalate);
    }

    #[tokio::test]
    async fn test_exact_threshold_does_not_escalate() {
        let tracker = tracker();
        // 5 failures / 10 calls: rate == 0.5, strictly-greater required
        for _ in 0..5 {
            tracker.record_outcome("int-1", true, None).await;
        }
        let mut last = None;
        for _ in 0..5 {
            last = Some(tracker.record_outcome("int-1", false, Some("err")).await);
        }
        assert!(!last.unwrap().should_escalate);
    }

    #[tokio::test]
    async fn test_list_health_and_critical_ids() {
        let tracker = tracker();
        tracker.record_outcome("healthy", true, None).await;
        for i in 0..10 {
            tracker
                .record_outcome("failing", i < 3, Some("boom"))
                .await;
        }

        let scores = tracker.list_health().await;
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["healthy"], 100.0);
        assert!((scores["failing"] - 30.0).abs() < 1e-9);

        assert_eq!(tracker.critical_ids().await, vec!["failing".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_reports_same_id_stay_consistent() {
        let tracker = Arc::new(tracker());
        let mut handles = Vec::new();
        for i in 0..50 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .record_outcome("int-1", i % 2 == 0, Some("err"))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snap = tracker.get_health("int-1").await.unwrap();
        assert_eq!(snap.total_calls, 50);
        assert_eq!(snap.failed_calls, 25);
        assert!(snap.recent_errors.len() <= warden_common::RECENT_ERRORS_CAP);
    }

    #[tokio::test]
    async fn test_concurrent_reports_distinct_ids() {
        let tracker = Arc::new(tracker());
        let mut handles = Vec::new();
        for i in 0..20 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("int-{}", i % 4);
                tracker.record_outcome(&id, true, None).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let scores = tracker.list_health().await;
        assert_eq!(scores.len(), 4);
        let total: u64 = {
            let mut sum = 0;
            for id in scores.keys() {
                sum += tracker.get_health(id).await.unwrap().total_calls;
            }
            sum
        };
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn test_reset_clears_counters() {
        let tracker = tracker();
        for _ in 0..10 {
            tracker.record_outcome("int-1", false, Some("err")).await;
        }
        tracker.reset("int-1").await;
        let snap = tracker.get_health("int-1").await.unwrap();
        assert_eq!(snap.total_calls, 0);
        assert_eq!(snap.health_score, 100.0);
    }
}
