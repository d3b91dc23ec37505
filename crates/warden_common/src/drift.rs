//! Drift classification - maps a structural diff to a drift report.
//!
//! Rule table, max-severity accumulation: every edit is scored and the
//! report carries the worst verdict seen. A single removed endpoint is
//! enough to mark the whole report breaking.

use crate::spec_diff::{ChangeKind, SchemaChange, StructuralDiff};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Overall drift verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    /// No structural change.
    None,
    /// Additions or cosmetic changes only.
    NonBreaking,
    /// Incompatible with the integration's assumptions.
    Breaking,
}

/// Severity, ordered so `max` accumulates across rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Result of classifying one baseline-vs-live comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift_type: DriftType,
    pub severity: DriftSeverity,
    /// Field path -> human description of the edit.
    pub changes: BTreeMap<String, String>,
    pub is_backward_compatible: bool,
    pub detected_at: DateTime<Utc>,
}

impl DriftReport {
    pub fn is_breaking(&self) -> bool {
        self.drift_type == DriftType::Breaking
    }

    /// The dominant breaking change, used to build the diagnosis reason.
    /// Endpoint removals win over field-level edits.
    pub fn dominant_change(&self) -> Option<&str> {
        self.endpoint_removal()
            .or_else(|| self.changes.values().next().map(|desc| desc.as_str()))
    }

    /// Description of the first removed endpoint, if any.
    pub fn endpoint_removal(&self) -> Option<&str> {
        self.changes
            .iter()
            .find(|(path, desc)| is_endpoint_path(path) && desc.starts_with("removed"))
            .map(|(_, desc)| desc.as_str())
    }
}

/// Classify a structural diff into a drift report.
pub fn classify(diff: &StructuralDiff) -> DriftReport {
    if diff.is_empty() {
        return DriftReport {
            drift_type: DriftType::None,
            severity: DriftSeverity::Low,
            changes: BTreeMap::new(),
            is_backward_compatible: true,
            detected_at: Utc::now(),
        };
    }

    let mut severity = DriftSeverity::Low;
    let mut breaking = false;
    let mut changes = BTreeMap::new();

    for change in &diff.changes {
        if let Some(rule_severity) = breaking_severity(change) {
            severity = severity.max(rule_severity);
            breaking = true;
        }
        changes.insert(change.path.clone(), change.describe());
    }

    DriftReport {
        drift_type: if breaking {
            DriftType::Breaking
        } else {
            DriftType::NonBreaking
        },
        severity,
        changes,
        is_backward_compatible: !breaking,
        detected_at: Utc::now(),
    }
}

/// Severity contributed by one edit, or `None` if it is non-breaking.
fn breaking_severity(change: &SchemaChange) -> Option<DriftSeverity> {
    match &change.kind {
        ChangeKind::Removed => {
            if is_endpoint_path(&change.path) {
                Some(DriftSeverity::Critical)
            } else if is_property_path(&change.path) {
                Some(DriftSeverity::High)
            } else {
                None
            }
        }
        ChangeKind::TypeChanged { .. } => Some(DriftSeverity::High),
        ChangeKind::ValueChanged { .. } => {
            if makes_newly_required(change) || is_property_type_decl(&change.path) {
                Some(DriftSeverity::High)
            } else {
                None
            }
        }
        ChangeKind::Added => None,
    }
}

/// A route key under `paths`, or an operation directly under one.
/// Deeper edits (responses, parameters) classify by the other rules.
fn is_endpoint_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    segments.first() == Some(&"paths") && (2..=3).contains(&segments.len())
}

/// A field inside some schema's `properties` set.
fn is_property_path(path: &str) -> bool {
    path.split('.').any(|s| s == "properties")
}

/// The declared wire type of a property (`...properties.<field>.type`).
/// A change here is a type change in the API even though the JSON edit is
/// a string value change.
fn is_property_type_decl(path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    segments.last() == Some(&"type") && is_property_path(path)
}

/// `required` flipped to true, or a `required` array gained entries.
fn makes_newly_required(change: &SchemaChange) -> bool {
    if change.path.split('.').next_back() != Some("required") {
        return false;
    }
    match &change.kind {
        ChangeKind::ValueChanged { from, to } => match (from, to) {
            (_, Value::Bool(true)) => true,
            (Value::Array(old), Value::Array(new)) => new.iter().any(|item| !old.contains(item)),
            _ => false,
        },
        _ => false,
    }
}
