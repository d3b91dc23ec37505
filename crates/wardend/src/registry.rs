//! Integration registry seam.
//!
//! The fleet itself is owned elsewhere (persistence is an external
//! collaborator); the monitor only needs to enumerate active
//! integrations and read their stored baselines. Production runs the
//! in-memory registry seeded from config; tests and a future persistent
//! store plug in through the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use warden_common::SchemaDoc;

/// Where an integration is in its lifecycle. Only `Active` ones are
/// scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Paused,
    Decommissioned,
}

/// Registry row for one integration.
#[derive(Debug, Clone)]
pub struct IntegrationRecord {
    pub id: String,
    pub status: LifecycleStatus,
    /// Stored baseline the live spec is diffed against.
    pub baseline: SchemaDoc,
    pub live_spec_url: Option<String>,
}

impl IntegrationRecord {
    pub fn new(id: impl Into<String>, baseline: SchemaDoc, live_spec_url: Option<String>) -> Self {
        Self {
            id: id.into(),
            status: LifecycleStatus::Active,
            baseline,
            live_spec_url,
        }
    }
}

#[async_trait]
pub trait IntegrationRegistry: Send + Sync {
    /// All integrations eligible for drift scanning.
    async fn list_active(&self) -> Vec<IntegrationRecord>;

    async fn get(&self, id: &str) -> Option<IntegrationRecord>;
}

/// In-memory registry, the single-instance production default.
#[derive(Default)]
pub struct InMemoryRegistry {
    records: RwLock<HashMap<String, IntegrationRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: IntegrationRecord) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    pub async fn set_status(&self, id: &str, status: LifecycleStatus) {
        if let Some(record) = self.records.write().await.get_mut(id) {
            record.status = status;
        }
    }

    /// Replace a stored baseline, e.g. after a successful re-ingest.
    pub async fn update_baseline(&self, id: &str, baseline: SchemaDoc) {
        if let Some(record) = self.records.write().await.get_mut(id) {
            record.baseline = baseline;
        }
    }
}

#[async_trait]
impl IntegrationRegistry for InMemoryRegistry {
    async fn list_active(&self) -> Vec<IntegrationRecord> {
        let records = self.records.read().await;
        let mut active: Vec<IntegrationRecord> = records
            .values()
            .filter(|r| r.status == LifecycleStatus::Active)
            .cloned()
            .collect();
        // stable scan order keeps logs comparable between ticks
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }

    async fn get(&self, id: &str) -> Option<IntegrationRecord> {
        self.records.read().await.get(id).cloned()
    }
}
