//! Per-integration health records.
//!
//! Counters only ever move through `record_success`/`record_failure`,
//! so `failed_calls <= total_calls` holds by construction and the score
//! is always derived, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded error history per integration, oldest evicted first.
pub const RECENT_ERRORS_CAP: usize = 10;

/// Mutable health record for one integration.
#[derive(Debug, Clone)]
pub struct IntegrationHealth {
    pub integration_id: String,
    total_calls: u64,
    failed_calls: u64,
    recent_errors: VecDeque<String>,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl IntegrationHealth {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            total_calls: 0,
            failed_calls: 0,
            recent_errors: VecDeque::with_capacity(RECENT_ERRORS_CAP),
            last_success_at: None,
            last_failure_at: None,
        }
    }

    pub fn record_success(&mut self) {
        self.total_calls += 1;
        self.last_success_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self, error: Option<&str>) {
        self.total_calls += 1;
        self.failed_calls += 1;
        self.last_failure_at = Some(Utc::now());

        let message = error.unwrap_or("unspecified error").to_string();
        if self.recent_errors.len() == RECENT_ERRORS_CAP {
            self.recent_errors.pop_front();
        }
        self.recent_errors.push_back(message);
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn failed_calls(&self) -> u64 {
        self.failed_calls
    }

    /// 0.0 when nothing has been recorded yet.
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.failed_calls as f64 / self.total_calls as f64
        }
    }

    /// `max(0, 100 - failure_rate * 100)`; 100 with no calls recorded.
    pub fn health_score(&self) -> f64 {
        (100.0 - self.failure_rate() * 100.0).max(0.0)
    }

    /// Most recent error, if any failure has been recorded.
    pub fn latest_error(&self) -> Option<&str> {
        self.recent_errors.back().map(|s| s.as_str())
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            integration_id: self.integration_id.clone(),
            total_calls: self.total_calls,
            failed_calls: self.failed_calls,
            health_score: self.health_score(),
            recent_errors: self.recent_errors.iter().cloned().collect(),
            last_success_at: self.last_success_at,
            last_failure_at: self.last_failure_at,
        }
    }
}

/// Serializable copy of a health record, returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub integration_id: String,
    pub total_calls: u64,
    pub failed_calls: u64,
    pub health_score: f64,
    pub recent_errors: Vec<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}
