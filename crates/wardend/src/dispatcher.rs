//! Remediation dispatch.
//!
//! Translates a selected strategy into pipeline commands and submits
//! them to the downstream sink. At-least-once semantics: duplicate
//! requests are safe because every strategy is idempotent downstream.
//! A dispatch failure never propagates; it degrades to a request for
//! manual intervention.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use warden_common::{
    PipelineAction, PipelineCommand, RemediationOutcome, RemediationRequest, RemediationStrategy,
    WardenError,
};

/// Outbound boundary to the ingestion/mapping/deployment pipeline.
/// `submit` returns once the command is accepted; completion is
/// asynchronous and out of scope here.
#[async_trait]
pub trait PipelineSink: Send + Sync {
    async fn submit(&self, command: PipelineCommand) -> Result<(), WardenError>;
}

/// Production sink: a bounded channel drained by whatever hosts the
/// pipeline client. Backpressure and retries live on the consumer side
/// of the channel, not inside the monitor.
pub struct ChannelPipeline {
    tx: mpsc::Sender<PipelineCommand>,
}

impl ChannelPipeline {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PipelineCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PipelineSink for ChannelPipeline {
    async fn submit(&self, command: PipelineCommand) -> Result<(), WardenError> {
        self.tx
            .send(command)
            .await
            .map_err(|e| WardenError::Pipeline(format!("pipeline channel closed: {e}")))
    }
}

pub struct RemediationDispatcher {
    sink: Arc<dyn PipelineSink>,
    timeout: Duration,
}

impl RemediationDispatcher {
    pub fn new(sink: Arc<dyn PipelineSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Execute one remediation request. Never returns an error: dispatch
    /// failures surface as `manual_intervention_requested`.
    pub async fn dispatch(&self, request: &RemediationRequest) -> RemediationOutcome {
        info!(
            integration_id = %request.integration_id,
            strategy = ?request.strategy,
            trigger = ?request.trigger_source,
            "Dispatching remediation"
        );

        let result = match request.strategy {
            RemediationStrategy::NotifyAdminAuth => self
                .submit(request, PipelineAction::NotifyAdmin)
                .await
                .map(|_| RemediationOutcome::new(false, "admin_notified")),
            RemediationStrategy::RefreshSchemaAndRemap => {
                match self.submit(request, PipelineAction::Reingest).await {
                    Ok(()) => self
                        .submit(request, PipelineAction::Remap)
                        .await
                        .map(|_| RemediationOutcome::new(true, "reingest_and_remap_requested")),
                    Err(e) => Err(e),
                }
            }
            RemediationStrategy::RemapFields => self
                .submit(request, PipelineAction::Remap)
                .await
                .map(|_| RemediationOutcome::new(true, "remap_requested")),
            RemediationStrategy::RetryWithBackoff => self
                .submit(request, PipelineAction::ScheduleRetry)
                .await
                .map(|_| RemediationOutcome::new(false, "retry_scheduled")),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    integration_id = %request.integration_id,
                    error = %e,
                    "Remediation dispatch failed, requesting manual intervention"
                );
                RemediationOutcome::manual_intervention()
            }
        }
    }

    async fn submit(
        &self,
        request: &RemediationRequest,
        action: PipelineAction,
    ) -> Result<(), WardenError> {
        let command = PipelineCommand::new(action, &request.integration_id, &request.reason);
        match tokio::time::timeout(self.timeout, self.sink.submit(command)).await {
            Ok(result) => result,
            Err(_) => Err(WardenError::Pipeline(format!(
                "pipeline submit timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use warden_common::TriggerSource;

    /// Records submitted commands; optionally fails every submit.
    struct RecordingSink {
        commands: Mutex<Vec<PipelineCommand>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                commands: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl PipelineSink for RecordingSink {
        async fn submit(&self, command: PipelineCommand) -> Result<(), WardenError> {
            if self.fail {
                return Err(WardenError::Pipeline("downstream unavailable".into()));
            }
            self.commands.lock().await.push(command);
            Ok(())
        }
    }

    fn dispatcher(sink: Arc<RecordingSink>) -> RemediationDispatcher {
        RemediationDispatcher::new(sink, Duration::from_secs(1))
    }

    fn request(reason: &str) -> RemediationRequest {
        RemediationRequest::from_reason("int-1", reason, TriggerSource::HealthThreshold)
    }

    #[tokio::test]
    async fn test_auth_notifies_admin_not_recovered() {
        let sink = RecordingSink::new(false);
        let outcome = dispatcher(sink.clone()).dispatch(&request("401 Unauthorized")).await;

        assert!(!outcome.recovered);
        assert_eq!(outcome.action, "admin_notified");
        let commands = sink.commands.lock().await;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].action, PipelineAction::NotifyAdmin);
    }

    #[tokio::test]
    async fn test_endpoint_drift_reingests_then_remaps() {
        let sink = RecordingSink::new(false);
        let outcome = dispatcher(sink.clone()).dispatch(&request("404 Not Found")).await;

        assert!(outcome.recovered);
        assert_eq!(outcome.action, "reingest_and_remap_requested");
        let commands = sink.commands.lock().await;
        let actions: Vec<_> = commands.iter().map(|c| c.action).collect();
        assert_eq!(actions, vec![PipelineAction::Reingest, PipelineAction::Remap]);
    }

    #[tokio::test]
    async fn test_schema_drift_remaps_only() {
        let sink = RecordingSink::new(false);
        let outcome = dispatcher(sink.clone())
            .dispatch(&request("schema validation failed"))
            .await;

        assert!(outcome.recovered);
        assert_eq!(outcome.action, "remap_requested");
        assert_eq!(sink.commands.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_schedules_retry_not_recovered() {
        let sink = RecordingSink::new(false);
        let outcome = dispatcher(sink.clone()).dispatch(&request("connection reset")).await;

        assert!(!outcome.recovered);
        assert_eq!(outcome.action, "retry_scheduled");
        assert_eq!(
            sink.commands.lock().await[0].action,
            PipelineAction::ScheduleRetry
        );
    }

    #[tokio::test]
    async fn test_sink_failure_degrades_to_manual_intervention() {
        let sink = RecordingSink::new(true);
        let outcome = dispatcher(sink).dispatch(&request("404 Not Found")).await;

        assert!(!outcome.recovered);
        assert_eq!(outcome.action, "manual_intervention_requested");
    }

    #[tokio::test]
    async fn test_slow_sink_times_out_to_manual_intervention() {
        struct StalledSink;

        #[async_trait]
        impl PipelineSink for StalledSink {
            async fn submit(&self, _command: PipelineCommand) -> Result<(), WardenError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let dispatcher =
            RemediationDispatcher::new(Arc::new(StalledSink), Duration::from_millis(50));
        let outcome = dispatcher.dispatch(&request("connection reset")).await;
        assert_eq!(outcome.action, "manual_intervention_requested");
    }

    #[tokio::test]
    async fn test_duplicate_dispatch_is_tolerated() {
        let sink = RecordingSink::new(false);
        let dispatcher = dispatcher(sink.clone());
        let req = request("schema validation failed");

        let first = dispatcher.dispatch(&req).await;
        let second = dispatcher.dispatch(&req).await;
        assert_eq!(first, second);
        assert_eq!(sink.commands.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_channel_pipeline_delivers_commands() {
        let (pipeline, mut rx) = ChannelPipeline::new(8);
        let dispatcher = RemediationDispatcher::new(Arc::new(pipeline), Duration::from_secs(1));
        dispatcher.dispatch(&request("404 Not Found")).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.action, PipelineAction::Reingest);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.action, PipelineAction::Remap);
    }
}
