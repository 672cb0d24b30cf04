use std::sync::Arc;
use std::time::Duration;

use audiohook_common::{BookMetadata, FlatRecord};
use audiohook_parser::guess_title_author;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::job::{QueueJob, WebhookPayload};
use crate::metadata::MetadataCoordinator;
use crate::notifications::NotificationManager;
use crate::store::RecordStore;

/// Metadata synthesized from the webhook itself when every provider step
/// came up empty.
pub fn fallback_metadata(payload: &WebhookPayload) -> BookMetadata {
    let guess = guess_title_author(&payload.name);
    BookMetadata::fallback(guess.title, guess.author)
}

/// Single consumer of the ingestion queue.
pub struct Worker {
    receiver: mpsc::Receiver<QueueJob>,
    coordinator: Arc<MetadataCoordinator>,
    store: Arc<dyn RecordStore>,
    notifications: Arc<NotificationManager>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        receiver: mpsc::Receiver<QueueJob>,
        coordinator: Arc<MetadataCoordinator>,
        store: Arc<dyn RecordStore>,
        notifications: Arc<NotificationManager>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            coordinator,
            store,
            notifications,
            poll_interval,
            cancel,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain the queue until cancelled or every producer is gone.
    pub async fn run(mut self) {
        info!("Metadata worker started");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let job = match tokio::time::timeout(self.poll_interval, self.receiver.recv()).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    info!("Job queue closed");
                    break;
                }
                Err(_) => continue,
            };

            let token = job.token;
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    warn!(token = %token, "Shutdown interrupted job");
                    break;
                }
                _ = self.process(&job) => {}
            }
        }

        info!("Metadata worker stopped");
    }

    /// Resolve one job and hand the record to the store and notifiers.
    pub async fn process(&self, job: &QueueJob) -> FlatRecord {
        let wait = chrono::Utc::now() - job.enqueued_at;
        info!(
            token = %job.token,
            name = %job.payload.name,
            queued_ms = wait.num_milliseconds(),
            "Processing job"
        );

        let report = self
            .coordinator
            .resolve(&job.payload.name, &job.payload.url)
            .await;
        let steps = report
            .visited
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let metadata = report.into_metadata().unwrap_or_else(|| {
            debug!(token = %job.token, "Using fallback metadata");
            fallback_metadata(&job.payload)
        });

        let record = build_record(job, &metadata, steps);

        if let Err(e) = self.store.save(job.token, record.clone()).await {
            warn!(token = %job.token, error = %e, "Failed to store record");
        }
        self.notifications.notify_all(job.token, &record).await;

        info!(token = %job.token, source = %metadata.source, "Job processed");
        record
    }
}

fn build_record(job: &QueueJob, metadata: &BookMetadata, steps: String) -> FlatRecord {
    let mut record = metadata.to_flat_record();
    record.insert("token".into(), Value::from(job.token.to_string()));
    record.insert("name".into(), Value::from(job.payload.name.clone()));
    record.insert("url".into(), Value::from(job.payload.url.clone()));
    record.insert(
        "download_url".into(),
        Value::from(job.payload.download_url.clone()),
    );
    record.insert(
        "enqueued_at".into(),
        Value::from(job.enqueued_at.to_rfc3339()),
    );
    record.insert("steps".into(), Value::from(steps));
    record
}
