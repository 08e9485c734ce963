//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params to the application services.

use crate::error::to_rpc_error;
use crate::types::{
    ListResponse, QueueStatusResponse, StatsResponse, StatusRequest, SubmitRequest,
    SubmitResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use tokio::sync::watch;
use tracing::debug;
use transflow_core::application::{DispatcherActivity, StatusService, SubmissionService};
use transflow_core::domain::{JobSnapshot, JobStatus};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    submission: SubmissionService,
    status: StatusService,
    activity: watch::Receiver<DispatcherActivity>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        submission: SubmissionService,
        status: StatusService,
        activity: watch::Receiver<DispatcherActivity>,
    ) -> Self {
        Self {
            submission,
            status,
            activity,
            start_time: std::time::Instant::now(),
        }
    }

    /// translation.submit.v1
    pub async fn submit(&self, params: SubmitRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        let request = self.submission.submit(params).await.map_err(to_rpc_error)?;

        Ok(SubmitResponse {
            client_id: request.client_id,
            status: JobStatus::Queued.to_string(),
        })
    }

    /// translation.status.v1
    pub async fn status(&self, params: StatusRequest) -> Result<JobSnapshot, ErrorObjectOwned> {
        debug!(client_id = %params.client_id, "Status query");
        self.status
            .get(&params.client_id)
            .await
            .map_err(to_rpc_error)
    }

    /// translation.list.v1
    pub async fn list(&self) -> Result<ListResponse, ErrorObjectOwned> {
        let translations = self.status.list().await.map_err(to_rpc_error)?;

        Ok(ListResponse {
            count: translations.len(),
            translations,
        })
    }

    /// translation.queue.v1
    pub fn queue(&self) -> QueueStatusResponse {
        let pending = self.submission.pending();
        let activity = self.activity.borrow().clone();

        QueueStatusResponse {
            status_message: activity.status_message(pending).to_string(),
            pending,
            in_flight: activity.in_flight,
        }
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        let counts = self.status.counts().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            total: counts.total(),
            queued: counts.queued,
            processing: counts.processing,
            completed: counts.completed,
            error: counts.error,
            pending: self.submission.pending(),
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use std::sync::Arc;
    use transflow_core::application::{job_queue, QueueReceiver};
    use transflow_core::port::snapshot_store::mocks::InMemorySnapshotStore;
    use transflow_core::port::SnapshotStore;

    fn handler() -> (RpcHandler, Arc<InMemorySnapshotStore>, QueueReceiver) {
        let store = Arc::new(InMemorySnapshotStore::new());
        let (tx, rx) = job_queue();
        let (_activity_tx, activity) = watch::channel(DispatcherActivity::default());
        let handler = RpcHandler::new(
            SubmissionService::new(store.clone(), tx),
            StatusService::new(store.clone()),
            activity,
        );
        (handler, store, rx)
    }

    #[tokio::test]
    async fn test_submit_returns_queued() {
        let (handler, store, mut rx) = handler();

        let response = handler
            .submit(SubmitRequest::new("c1", "bonjour", "en"))
            .await
            .unwrap();

        assert_eq!(response.client_id, "c1");
        assert_eq!(response.status, "QUEUED");
        assert_eq!(rx.recv().await.unwrap().client_id, "c1");
        assert_eq!(
            store.get("c1").await.unwrap().unwrap().status,
            JobStatus::Queued
        );
    }

    #[tokio::test]
    async fn test_submit_missing_language_is_validation_error() {
        let (handler, store, _rx) = handler();

        let err = handler
            .submit(SubmitRequest {
                client_id: Some("c3".into()),
                text: Some("hello".into()),
                target_language: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), code::VALIDATION_ERROR);
        assert!(store.get("c3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_unknown_is_not_found() {
        let (handler, _store, _rx) = handler();

        let err = handler
            .status(StatusRequest {
                client_id: "ghost".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_queue_and_stats() {
        let (handler, _store, _rx) = handler();
        assert_eq!(handler.queue().status_message, "Queue is empty");

        handler
            .submit(SubmitRequest::new("a", "text", "en"))
            .await
            .unwrap();
        handler
            .submit(SubmitRequest::new("b", "text", "en"))
            .await
            .unwrap();

        let queue = handler.queue();
        assert_eq!(queue.pending, 2);
        assert_eq!(queue.status_message, "Processing translation");

        let stats = tokio_test::assert_ok!(handler.stats().await);
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.total, 2);

        let list = handler.list().await.unwrap();
        assert_eq!(list.count, 2);
        assert!(list.translations.contains_key("a"));
    }
}
