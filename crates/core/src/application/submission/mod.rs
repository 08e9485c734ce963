// Submission Gate - admits jobs into the queue

pub mod submit;


pub use submit::{validate_request, SubmitRequest};

use crate::application::queue::QueueSender;
use crate::domain::JobRequest;
use crate::error::Result;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{SnapshotStore, TimeProvider};
use std::sync::Arc;

/// Submission service: validate, record QUEUED, enqueue, return immediately
pub struct SubmissionService {
    store: Arc<dyn SnapshotStore>,
    queue: QueueSender,
    time_provider: Arc<dyn TimeProvider>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn SnapshotStore>, queue: QueueSender) -> Self {
        Self {
            store,
            queue,
            time_provider: Arc::new(SystemTimeProvider),
        }
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    /// Admit a job; never waits for the pipeline
    pub async fn submit(&self, req: SubmitRequest) -> Result<JobRequest> {
        submit::execute(
            self.store.as_ref(),
            &self.queue,
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    /// Jobs admitted but not yet picked up by the dispatcher
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }
}
