// Status Query - read-only access to job snapshots

use crate::domain::{ClientId, JobSnapshot, JobStatus};
use crate::error::{AppError, Result};
use crate::port::SnapshotStore;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Snapshot counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub queued: i64,
    pub processing: i64,
    pub completed: i64,
    pub error: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.queued + self.processing + self.completed + self.error
    }
}

/// Pass-through to the snapshot store; safe to call while the dispatcher
/// is mid-pipeline for the same id
pub struct StatusService {
    store: Arc<dyn SnapshotStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, client_id: &str) -> Result<JobSnapshot> {
        self.store
            .get(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client ID {} not found", client_id)))
    }

    pub async fn list(&self) -> Result<BTreeMap<ClientId, JobSnapshot>> {
        self.store.list().await
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for status in JobStatus::ALL {
            let n = self.store.count_by_status(status).await?;
            match status {
                JobStatus::Queued => counts.queued = n,
                JobStatus::Processing => counts.processing = n,
                JobStatus::Completed => counts.completed = n,
                JobStatus::Error => counts.error = n,
            }
        }
        Ok(counts)
    }
}
