//! Shared fixtures for the end-to-end tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use transflow_core::application::{
    job_queue, Dispatcher, DispatcherConfig, PipelinePorts, StatusService, SubmissionService,
    SubmitRequest,
};
use transflow_core::domain::{ClientId, JobRequest, JobSnapshot, JobStatus};
use transflow_core::error::Result;
use transflow_core::port::log_sink::mocks::RecordingLogSink;
use transflow_core::port::stage::mocks::MockStage;
use transflow_core::port::time_provider::mocks::SteppingTimeProvider;
use transflow_core::port::translation_provider::mocks::MockTranslationProvider;
use transflow_core::port::{ProviderError, SnapshotStore, TranslationProvider};
use transflow_infra_sqlite::{create_pool, database_url, run_migrations, SqliteSnapshotStore};

/// SQLite database file under the system temp dir, removed on drop
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("transflow-it-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub async fn open(&self) -> Arc<SqliteSnapshotStore> {
        let pool = create_pool(&database_url(&self.path)).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Arc::new(SqliteSnapshotStore::new(pool))
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Store decorator that keeps a copy of every successful write
pub struct RecordingStore {
    inner: Arc<dyn SnapshotStore>,
    writes: Mutex<Vec<JobSnapshot>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn SnapshotStore>) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes_for(&self, client_id: &str) -> Vec<JobSnapshot> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SnapshotStore for RecordingStore {
    async fn upsert(&self, snapshot: &JobSnapshot) -> Result<()> {
        self.inner.upsert(snapshot).await?;
        self.writes.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn get(&self, client_id: &str) -> Result<Option<JobSnapshot>> {
        self.inner.get(client_id).await
    }

    async fn list(&self) -> Result<BTreeMap<ClientId, JobSnapshot>> {
        self.inner.list().await
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        self.inner.count_by_status(status).await
    }

    async fn reset(&self) -> Result<u64> {
        self.inner.reset().await
    }
}

/// Uppercasing provider that sleeps before every packet
pub struct SlowProvider {
    inner: MockTranslationProvider,
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTranslationProvider::uppercase(),
            delay,
        }
    }
}

#[async_trait]
impl TranslationProvider for SlowProvider {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> std::result::Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.inner.translate(text, target_language).await
    }
}

/// Deterministic fakes for every pipeline port
pub struct Fakes {
    pub provider: Arc<dyn TranslationProvider>,
    pub transform: Arc<MockStage>,
    pub secondary: Arc<MockStage>,
    pub log_sink: Arc<RecordingLogSink>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(MockTranslationProvider::uppercase()),
            transform: Arc::new(MockStage::reverse()),
            secondary: Arc::new(MockStage::echo()),
            log_sink: Arc::new(RecordingLogSink::new()),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn TranslationProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn ports(&self) -> PipelinePorts {
        PipelinePorts {
            provider: self.provider.clone(),
            transform: self.transform.clone(),
            secondary: self.secondary.clone(),
            log_sink: self.log_sink.clone(),
        }
    }
}

pub fn fast_config(packet_size: usize) -> DispatcherConfig {
    DispatcherConfig {
        packet_size,
        startup_delay: Duration::ZERO,
        ..Default::default()
    }
}

/// Gate, status query and a running dispatcher sharing one store
pub struct Pipeline {
    pub submission: SubmissionService,
    pub status: Arc<StatusService>,
    pub dispatcher: Arc<Dispatcher>,
    handle: JoinHandle<()>,
}

impl Pipeline {
    pub fn start(store: Arc<dyn SnapshotStore>, ports: PipelinePorts, config: DispatcherConfig) -> Self {
        let (tx, rx) = job_queue();
        let dispatcher = Arc::new(
            Dispatcher::new(
                rx,
                store.clone(),
                ports,
                Arc::new(SteppingTimeProvider::new(1_700_000_000_000, 5)),
                config,
            )
            .unwrap(),
        );

        let running = dispatcher.clone();
        let handle = tokio::spawn(async move {
            running.run().await.unwrap();
        });

        Self {
            submission: SubmissionService::new(store.clone(), tx),
            status: Arc::new(StatusService::new(store)),
            dispatcher,
            handle,
        }
    }

    pub async fn submit(&self, client_id: &str, text: &str, target_language: &str) -> JobRequest {
        self.submission
            .submit(SubmitRequest::new(client_id, text, target_language))
            .await
            .unwrap()
    }

    /// Close the queue and wait until every admitted job has been processed
    pub async fn drain(self) {
        let Pipeline {
            submission, handle, ..
        } = self;
        drop(submission);
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("dispatcher did not drain")
            .unwrap();
    }

    pub async fn stop(self) {
        self.dispatcher.stop();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Poll until `client_id` reaches COMPLETED or ERROR
pub async fn wait_for_terminal(status: &StatusService, client_id: &str) -> JobSnapshot {
    for _ in 0..1_000 {
        if let Ok(snapshot) = status.get(client_id).await {
            if snapshot.is_terminal() {
                return snapshot;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never reached a terminal status", client_id);
}
