//! Failure diagnosis - maps a raw failure reason to an issue category.
//!
//! Ordered substring rule table, data not code. First matching rule
//! wins; no rule means `Unknown`. Total: never fails on any input.

use serde::{Deserialize, Serialize};

/// Root-cause category for an accumulating failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Credential expiry or rejection (401, token errors).
    Authentication,
    /// Endpoint moved or disappeared (404).
    EndpointDrift,
    /// Payload no longer matches the expected shape.
    SchemaDrift,
    /// No matching pattern.
    Unknown,
}

struct DiagnosisRule {
    patterns: &'static [&'static str],
    category: IssueCategory,
}

/// Evaluated top to bottom; order is part of the contract
/// ("401 schema error" is an auth problem first).
const RULES: &[DiagnosisRule] = &[
    DiagnosisRule {
        patterns: &["401", "auth"],
        category: IssueCategory::Authentication,
    },
    DiagnosisRule {
        patterns: &["404", "not found"],
        category: IssueCategory::EndpointDrift,
    },
    DiagnosisRule {
        patterns: &["validation", "schema"],
        category: IssueCategory::SchemaDrift,
    },
];

/// Classify a failure reason string. Case-insensitive substring match.
pub fn diagnose(failure_reason: &str) -> IssueCategory {
    let reason = failure_reason.to_lowercase();
    for rule in RULES {
        if rule.patterns.iter().any(|p| reason.contains(p)) {
            return rule.category;
        }
    }
    IssueCategory::Unknown
}
