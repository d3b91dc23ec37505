//! Remediation strategies and the messages that carry them.
//!
//! Selection is a fixed total mapping from issue category to strategy.
//! A `RemediationRequest` records why and from where a remediation was
//! triggered; a `PipelineCommand` is the outbound message handed to the
//! downstream ingestion/mapping/deployment pipeline.

use crate::diagnosis::IssueCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStrategy {
    /// Credentials cannot be self-healed; a human gets paged.
    NotifyAdminAuth,
    /// Re-ingest the live spec, then re-map fields.
    RefreshSchemaAndRemap,
    /// Re-map fields against the existing spec.
    RemapFields,
    /// Defer and retry later.
    RetryWithBackoff,
}

/// Fixed mapping from diagnosis to strategy.
pub fn select_strategy(category: IssueCategory) -> RemediationStrategy {
    match category {
        IssueCategory::Authentication => RemediationStrategy::NotifyAdminAuth,
        IssueCategory::EndpointDrift => RemediationStrategy::RefreshSchemaAndRemap,
        IssueCategory::SchemaDrift => RemediationStrategy::RemapFields,
        IssueCategory::Unknown => RemediationStrategy::RetryWithBackoff,
    }
}

/// Which path raised the remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Event-driven: failure rate crossed the escalation threshold.
    HealthThreshold,
    /// Periodic scan found breaking drift.
    DriftScan,
}

/// One remediation request flowing diagnose -> select -> dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationRequest {
    pub id: String,
    pub integration_id: String,
    pub issue_category: IssueCategory,
    pub strategy: RemediationStrategy,
    /// The failure reason the diagnosis ran over.
    pub reason: String,
    pub triggered_at: DateTime<Utc>,
    pub trigger_source: TriggerSource,
}

impl RemediationRequest {
    /// Build a request by running diagnosis and selection over a reason.
    pub fn from_reason(
        integration_id: impl Into<String>,
        reason: impl Into<String>,
        trigger_source: TriggerSource,
    ) -> Self {
        let reason = reason.into();
        let issue_category = crate::diagnosis::diagnose(&reason);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            integration_id: integration_id.into(),
            issue_category,
            strategy: select_strategy(issue_category),
            reason,
            triggered_at: Utc::now(),
            trigger_source,
        }
    }
}

/// Action verbs the downstream pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAction {
    Reingest,
    Remap,
    NotifyAdmin,
    ScheduleRetry,
}

/// Outbound message to the downstream pipeline. Fire-and-forget at this
/// boundary; the pipeline acknowledges acceptance asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCommand {
    pub action: PipelineAction,
    pub integration_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl PipelineCommand {
    pub fn new(
        action: PipelineAction,
        integration_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action,
            integration_id: integration_id.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What a dispatch attempt produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub recovered: bool,
    pub action: String,
}

impl RemediationOutcome {
    pub fn new(recovered: bool, action: impl Into<String>) -> Self {
        Self {
            recovered,
            action: action.into(),
        }
    }

    /// Fallback when dispatch itself fails: a human takes over.
    pub fn manual_intervention() -> Self {
        Self::new(false, "manual_intervention_requested")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_mapping_is_total() {
        assert_eq!(
            select_strategy(IssueCategory::Authentication),
            RemediationStrategy::NotifyAdminAuth
        );
        assert_eq!(
            select_strategy(IssueCategory::EndpointDrift),
            RemediationStrategy::RefreshSchemaAndRemap
        );
        assert_eq!(
            select_strategy(IssueCategory::SchemaDrift),
            RemediationStrategy::RemapFields
        );
        assert_eq!(
            select_strategy(IssueCategory::Unknown),
            RemediationStrategy::RetryWithBackoff
        );
    }

    #[test]
    fn test_request_from_reason_runs_diagnosis() {
        let req = RemediationRequest::from_reason(
            "int-1",
            "401 Unauthorized",
            TriggerSource::HealthThreshold,
        );
        assert_eq!(req.issue_category, IssueCategory::Authentication);
        assert_eq!(req.strategy, RemediationStrategy::NotifyAdminAuth);
        assert_eq!(req.trigger_source, TriggerSource::HealthThreshold);
        assert!(!req.id.is_empty());
    }

    #[test]
    fn test_pipeline_command_serializes_snake_case() {
        let cmd = PipelineCommand::new(PipelineAction::ScheduleRetry, "int-1", "flaky upstream");
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"schedule_retry\""));
        assert!(json.contains("\"int-1\""));
    }
}
