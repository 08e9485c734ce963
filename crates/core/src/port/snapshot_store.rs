// Snapshot Store Port (Interface)

use crate::domain::{ClientId, JobSnapshot, JobStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Durable per-job snapshot storage.
///
/// The dispatcher is the only writer during processing; any number of status
/// readers may run concurrently. Implementations must replace a snapshot
/// atomically so readers never observe a partially written record.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Insert or replace the snapshot stored under `snapshot.client_id`
    async fn upsert(&self, snapshot: &JobSnapshot) -> Result<()>;

    /// Point lookup by client id
    async fn get(&self, client_id: &str) -> Result<Option<JobSnapshot>>;

    /// Every stored snapshot, keyed (and ordered) by client id
    async fn list(&self) -> Result<BTreeMap<ClientId, JobSnapshot>>;

    /// Count snapshots currently in `status`
    async fn count_by_status(&self, status: JobStatus) -> Result<i64>;

    /// Delete every snapshot, returning how many were removed
    async fn reset(&self) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::{Mutex, RwLock};

    /// In-memory store that also records every upsert in order
    #[derive(Default)]
    pub struct InMemorySnapshotStore {
        snapshots: RwLock<HashMap<ClientId, JobSnapshot>>,
        history: Mutex<Vec<JobSnapshot>>,
        fail_writes: Mutex<bool>,
    }

    impl InMemorySnapshotStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every snapshot written so far, oldest first
        pub fn history(&self) -> Vec<JobSnapshot> {
            self.history.lock().unwrap().clone()
        }

        /// Snapshots written for one client id, oldest first
        pub fn history_for(&self, client_id: &str) -> Vec<JobSnapshot> {
            self.history()
                .into_iter()
                .filter(|s| s.client_id == client_id)
                .collect()
        }

        /// Make subsequent upserts fail with a database error
        pub fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl SnapshotStore for InMemorySnapshotStore {
        async fn upsert(&self, snapshot: &JobSnapshot) -> Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::Database("mock store write failure".to_string()));
            }
            self.snapshots
                .write()
                .unwrap()
                .insert(snapshot.client_id.clone(), snapshot.clone());
            self.history.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn get(&self, client_id: &str) -> Result<Option<JobSnapshot>> {
            Ok(self.snapshots.read().unwrap().get(client_id).cloned())
        }

        async fn list(&self) -> Result<BTreeMap<ClientId, JobSnapshot>> {
            Ok(self
                .snapshots
                .read()
                .unwrap()
                .iter()
                .map(|(id, s)| (id.clone(), s.clone()))
                .collect())
        }

        async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
            Ok(self
                .snapshots
                .read()
                .unwrap()
                .values()
                .filter(|s| s.status == status)
                .count() as i64)
        }

        async fn reset(&self) -> Result<u64> {
            let mut snapshots = self.snapshots.write().unwrap();
            let removed = snapshots.len() as u64;
            snapshots.clear();
            Ok(removed)
        }
    }
}
