//! Warden Daemon - integration fleet watchdog.
//!
//! Wires the registry, spec source, health tracker, and dispatcher
//! together and runs the drift-scan loop until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wardend::config::WardenConfig;
use wardend::dispatcher::{ChannelPipeline, RemediationDispatcher};
use wardend::fetcher::HttpSpecSource;
use wardend::monitor::Monitor;
use wardend::registry::{InMemoryRegistry, IntegrationRecord, IntegrationRegistry};
use wardend::tracker::HealthTracker;
use warden_common::SchemaDoc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Warden Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = WardenConfig::resolve_path();
    let config = WardenConfig::load(&config_path)?;
    info!(
        config = %config_path.display(),
        integrations = config.integrations.len(),
        scan_interval_secs = config.scan_interval_secs,
        "Configuration loaded"
    );

    let registry = Arc::new(seed_registry(&config).await);
    let source = Arc::new(HttpSpecSource::new(config.fetch_timeout())?);
    let tracker = HealthTracker::new(config.escalation.clone());

    // Pipeline boundary: the real ingestion/mapping/deployment pipeline
    // consumes this channel. Until it is attached, accepted commands are
    // logged so operators can see what would have been remediated.
    let (pipeline, mut pipeline_rx) = ChannelPipeline::new(64);
    tokio::spawn(async move {
        while let Some(command) = pipeline_rx.recv().await {
            info!(
                action = ?command.action,
                integration_id = %command.integration_id,
                reason = %command.reason,
                "Pipeline command accepted"
            );
        }
    });

    let dispatcher = RemediationDispatcher::new(Arc::new(pipeline), config.dispatch_timeout());
    let monitor = Arc::new(Monitor::new(
        registry.clone(),
        source,
        tracker,
        dispatcher,
        config,
    ));

    let scan_task = monitor.start();
    info!(
        active = registry.list_active().await.len(),
        "Warden Daemon ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gracefully");
    scan_task.abort();

    Ok(())
}

/// Build the in-memory registry from config seeds, loading each stored
/// baseline from disk. A missing or unparsable baseline downgrades to
/// an empty document so the first scan reports everything as added
/// instead of failing the boot.
async fn seed_registry(config: &WardenConfig) -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();

    for seed in &config.integrations {
        let baseline = match &seed.baseline_path {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(raw) => match SchemaDoc::parse(&raw) {
                    Ok(doc) => doc,
                    Err(e) => {
                        warn!(integration_id = %seed.id, path = %path, error = %e, "Baseline unparsable, using empty");
                        SchemaDoc::empty()
                    }
                },
                Err(e) => {
                    warn!(integration_id = %seed.id, path = %path, error = %e, "Baseline unreadable, using empty");
                    SchemaDoc::empty()
                }
            },
            None => SchemaDoc::empty(),
        };

        registry
            .insert(IntegrationRecord::new(
                &seed.id,
                baseline,
                seed.live_spec_url.clone(),
            ))
            .await;
    }

    registry
}
