//! Warden Common - Shared types for the integration fleet monitor
//!
//! Pure logic only: schema documents, structural diffing, drift
//! classification, health records, failure diagnosis, and strategy
//! selection. No I/O in this crate.

pub mod diagnosis;
pub mod drift;
pub mod error;
pub mod health;
pub mod schema;
pub mod spec_diff;
pub mod strategy;

pub use diagnosis::{diagnose, IssueCategory};
pub use drift::{classify, DriftReport, DriftSeverity, DriftType};
pub use error::WardenError;
pub use health::{HealthSnapshot, IntegrationHealth, RECENT_ERRORS_CAP};
pub use schema::SchemaDoc;
pub use spec_diff::{diff, ChangeKind, SchemaChange, StructuralDiff};
pub use strategy::{
    select_strategy, PipelineAction, PipelineCommand, RemediationOutcome, RemediationRequest,
    RemediationStrategy, TriggerSource,
};
