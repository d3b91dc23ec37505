//! Live spec fetching.
//!
//! Every failure here is soft: the monitor logs it and skips the
//! integration for that cycle. The HTTP client carries a hard timeout
//! so one slow upstream cannot stall the scan.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use warden_common::{SchemaDoc, WardenError};

#[async_trait]
pub trait SpecSource: Send + Sync {
    /// Fetch and parse a live schema document.
    async fn fetch(&self, url: &str) -> Result<SchemaDoc, WardenError>;
}

/// Production spec source over HTTP(S).
pub struct HttpSpecSource {
    client: reqwest::Client,
}

impl HttpSpecSource {
    pub fn new(timeout: Duration) -> Result<Self, WardenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wardend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WardenError::Internal(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SpecSource for HttpSpecSource {
    async fn fetch(&self, url: &str) -> Result<SchemaDoc, WardenError> {
        debug!(url, "Fetching live spec");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WardenError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WardenError::Fetch(format!("{url} returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WardenError::Fetch(e.to_string()))?;

        SchemaDoc::parse(&body).map_err(|e| WardenError::SpecParse(e.to_string()))
    }
}
