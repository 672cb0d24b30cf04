use audiohook_common::{Error, JobToken, Result};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use super::job::QueueJob;

/// Producer handle for the bounded job queue.
#[derive(Clone)]
pub struct IngestQueue {
    sender: mpsc::Sender<QueueJob>,
    capacity: usize,
}

impl IngestQueue {
    /// Create a queue holding at most `capacity` jobs, returning the
    /// receiving end for the worker.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueueJob>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, receiver)
    }

    /// Enqueue without waiting. Fails with [`Error::QueueFull`] when the
    /// queue is at capacity.
    pub fn enqueue(&self, job: QueueJob) -> Result<JobToken> {
        let token = job.token;
        let name = job.payload.name.clone();

        match self.sender.try_send(job) {
            Ok(()) => {
                info!(token = %token, name = %name, pending = self.pending(), "Job queued");
                Ok(token)
            }
            Err(TrySendError::Full(_)) => {
                warn!(token = %token, capacity = self.capacity, "Queue full, rejecting job");
                Err(Error::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => Err(Error::internal("job queue is closed")),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs waiting for the worker.
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }
}
