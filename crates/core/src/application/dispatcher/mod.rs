// Dispatcher - drains the job queue and drives each job through the pipeline

mod activity;
mod config;
pub mod constants;

pub use activity::DispatcherActivity;
pub use config::DispatcherConfig;

use crate::application::queue::QueueReceiver;
use crate::domain::{JobRequest, JobSnapshot, Packetizer};
use crate::error::{AppError, Result};
use crate::port::{
    LogSink, SecondaryTranslationStage, SnapshotStore, TimeProvider, TransformStage,
    TranslationProvider,
};
use constants::completion_message;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// External collaborators of the pipeline
#[derive(Clone)]
pub struct PipelinePorts {
    pub provider: Arc<dyn TranslationProvider>,
    pub transform: Arc<dyn TransformStage>,
    pub secondary: Arc<dyn SecondaryTranslationStage>,
    pub log_sink: Arc<dyn LogSink>,
}

/// Sole writer of snapshots once a job has been admitted.
///
/// Each job is driven by an in-memory [`JobSnapshot`] which is written whole
/// to the store after every step, so pollers always see a consistent record.
pub struct Dispatcher {
    queue: Mutex<QueueReceiver>,
    store: Arc<dyn SnapshotStore>,
    ports: PipelinePorts,
    time_provider: Arc<dyn TimeProvider>,
    config: DispatcherConfig,
    packetizer: Packetizer,
    activity: watch::Sender<DispatcherActivity>,
    stopping: watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(
        queue: QueueReceiver,
        store: Arc<dyn SnapshotStore>,
        ports: PipelinePorts,
        time_provider: Arc<dyn TimeProvider>,
        config: DispatcherConfig,
    ) -> Result<Self> {
        config.validate()?;
        let packetizer = Packetizer::new(config.packet_size)?;
        let (activity, _) = watch::channel(DispatcherActivity::default());
        let (stopping, _) = watch::channel(false);

        Ok(Self {
            queue: Mutex::new(queue),
            store,
            ports,
            time_provider,
            config,
            packetizer,
            activity,
            stopping,
        })
    }

    /// Subscribe to in-flight job changes
    pub fn activity(&self) -> watch::Receiver<DispatcherActivity> {
        self.activity.subscribe()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Ask every worker to stop taking jobs. Jobs still in the queue stay
    /// QUEUED; jobs already in the pipeline run to a terminal status.
    pub fn stop(&self) {
        if !self.stopping.send_replace(true) {
            info!(in_flight = self.activity.borrow().in_flight.len(), "Dispatcher stopping");
        }
    }

    pub fn is_stopping(&self) -> bool {
        *self.stopping.borrow()
    }

    /// Run all workers until [`Dispatcher::stop`] is called or the queue
    /// closes. A job already in the pipeline is finished before its worker exits.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!(workers = self.config.worker_count, "Dispatcher started");

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.worker_count {
            let dispatcher = Arc::clone(&self);
            workers.spawn(async move { dispatcher.worker_loop(worker_id).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Dispatcher worker aborted");
            }
        }

        info!("Dispatcher stopped");
        Ok(())
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        debug!(worker_id, "Worker started");
        let mut stopping = self.stopping.subscribe();
        loop {
            if self.is_stopping() {
                info!(worker_id, "Worker stopped");
                break;
            }

            let request = tokio::select! {
                biased;
                _ = stopping.wait_for(|stop| *stop) => {
                    info!(worker_id, "Worker stopped while idle");
                    break;
                }
                request = self.next_request() => request,
            };

            match request {
                Some(request) => self.dispatch(request).await,
                None => {
                    info!(worker_id, "Job queue closed");
                    break;
                }
            }
        }
    }

    async fn next_request(&self) -> Option<JobRequest> {
        self.queue.lock().await.recv().await
    }

    /// Process one request in its own task so a panic inside the pipeline
    /// marks the job ERROR instead of killing the worker
    async fn dispatch(self: &Arc<Self>, request: JobRequest) {
        let client_id = request.client_id.clone();
        self.activity.send_modify(|a| a.begin(&client_id));

        let dispatcher = Arc::clone(self);
        let handle = tokio::spawn(async move { dispatcher.process_job(request).await });

        match handle.await {
            Ok(Ok(snapshot)) => {
                debug!(client_id = %client_id, status = %snapshot.status, "Job finished");
            }
            Ok(Err(e)) => {
                error!(client_id = %client_id, error = %e, "Job state could not be recorded");
            }
            Err(join_err) => self.record_aborted(&client_id, join_err).await,
        }

        self.activity.send_modify(|a| a.finish(&client_id));
    }

    /// Drive one job from QUEUED to a terminal status.
    ///
    /// Returns the terminal snapshot. `Err` means a state write failed and the
    /// stored record may lag behind the returned state.
    pub async fn process_job(&self, request: JobRequest) -> Result<JobSnapshot> {
        let packets = self.packetizer.split(&request.text);
        let mut snapshot = request.queued_snapshot();
        snapshot.start(
            packets.len(),
            self.time_provider.now_millis(),
            self.config.initial_time_remaining_secs,
        )?;
        self.store.upsert(&snapshot).await?;
        info!(
            client_id = %snapshot.client_id,
            target_language = %snapshot.target_language,
            packets = packets.len(),
            "Job started"
        );

        if !self.config.startup_delay.is_zero() {
            debug!(
                client_id = %snapshot.client_id,
                delay_ms = self.config.startup_delay.as_millis() as u64,
                "Waiting before first external call"
            );
            sleep(self.config.startup_delay).await;
        }

        match self
            .run_pipeline(&mut snapshot, &request.target_language, &packets)
            .await
        {
            Ok(final_text) => {
                self.notify_log_sink(&snapshot.client_id).await;
                snapshot.complete(final_text, self.time_provider.now_millis())?;
                info!(client_id = %snapshot.client_id, "Job completed");
            }
            Err(e) => {
                error!(
                    client_id = %snapshot.client_id,
                    phase = ?snapshot.phase,
                    packets_processed = snapshot.packets_processed,
                    error = %e,
                    "Job failed"
                );
                snapshot.fail(e.to_string(), self.time_provider.now_millis())?;
            }
        }

        self.store.upsert(&snapshot).await?;
        Ok(snapshot)
    }

    /// Translate every packet, then run both stages on the assembled text.
    /// Returns the assembled primary translation.
    async fn run_pipeline(
        &self,
        snapshot: &mut JobSnapshot,
        target_language: &str,
        packets: &[String],
    ) -> Result<String> {
        let mut translated = String::new();
        for (index, packet) in packets.iter().enumerate() {
            let text = self
                .ports
                .provider
                .translate(packet, target_language)
                .await?;
            translated.push_str(&text);

            snapshot.record_packet()?;
            self.store.upsert(snapshot).await?;
            debug!(
                client_id = %snapshot.client_id,
                packet = index + 1,
                total = snapshot.packet_count,
                "Packet translated"
            );
        }

        snapshot.begin_transform()?;
        self.store.upsert(snapshot).await?;
        let transformed = self
            .ports
            .transform
            .transform(&translated)
            .await
            .map_err(AppError::Transform)?;
        snapshot.record_transform(transformed)?;
        self.store.upsert(snapshot).await?;

        // Stage B consumes the primary translation, not the stage A output
        snapshot.begin_retranslation()?;
        self.store.upsert(snapshot).await?;
        let retranslated = self
            .ports
            .secondary
            .retranslate(&translated)
            .await
            .map_err(AppError::Retranslation)?;
        snapshot.record_retranslation(retranslated)?;
        self.store.upsert(snapshot).await?;

        Ok(translated)
    }

    async fn notify_log_sink(&self, client_id: &str) {
        let message = completion_message(client_id);
        if let Err(e) = self.ports.log_sink.notify(client_id, &message).await {
            warn!(client_id = %client_id, error = %e, "Log sink notification failed");
        }
    }

    /// The pipeline task died without recording a terminal status
    async fn record_aborted(&self, client_id: &str, join_err: JoinError) {
        let description = if join_err.is_panic() {
            error!(client_id = %client_id, "Job panicked: {:?}", join_err);
            "Pipeline panicked"
        } else {
            error!(client_id = %client_id, "Job cancelled: {:?}", join_err);
            "Pipeline cancelled"
        };

        let mut snapshot = match self.store.get(client_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(e) => {
                error!(client_id = %client_id, error = %e, "Failed to load snapshot after abort");
                return;
            }
        };

        if snapshot.fail(description, self.time_provider.now_millis()).is_err() {
            return;
        }
        if let Err(e) = self.store.upsert(&snapshot).await {
            error!(client_id = %client_id, error = %e, "Failed to record aborted job");
        }
    }
}
