// Submit Use Case

use crate::application::queue::QueueSender;
use crate::domain::JobRequest;
use crate::error::{AppError, Result};
use crate::port::{SnapshotStore, TimeProvider};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Recorded on a job the queue refused
pub const NOT_SCHEDULED: &str = "Job queue closed; translation was not scheduled";

/// Submit request as received from a client; absent fields are `None`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
}

impl SubmitRequest {
    pub fn new(
        client_id: impl Into<String>,
        text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            text: Some(text.into()),
            target_language: Some(target_language.into()),
        }
    }
}

/// Reject absent or empty fields. Values are kept exactly as sent: the
/// client id is the caller's key for later status queries.
pub fn validate_request(req: &SubmitRequest) -> Result<JobRequest> {
    let missing: Vec<&str> = [
        ("client_id", &req.client_id),
        ("text", &req.text),
        ("target_language", &req.target_language),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(JobRequest::new(
        req.client_id.clone().unwrap_or_default(),
        req.text.clone().unwrap_or_default(),
        req.target_language.clone().unwrap_or_default(),
    ))
}

/// Execute submit use case
///
/// The QUEUED snapshot is written before the request is enqueued, so the
/// dispatcher's first write for this job always lands after it.
/// If the queue refuses the request the snapshot is moved to ERROR, so no
/// QUEUED record is left behind that nothing will ever pick up.
/// No in-flight check is made for the client id: duplicate submissions race
/// and the pipeline that finishes last wins.
pub async fn execute(
    store: &dyn SnapshotStore,
    queue: &QueueSender,
    time_provider: &dyn TimeProvider,
    req: SubmitRequest,
) -> Result<JobRequest> {
    let request = validate_request(&req)?;

    let mut snapshot = request.queued_snapshot();
    store.upsert(&snapshot).await?;
    if let Err(e) = queue.push(request.clone()) {
        warn!(client_id = %request.client_id, error = %e, "Job not scheduled");
        snapshot.fail(NOT_SCHEDULED, time_provider.now_millis())?;
        store.upsert(&snapshot).await?;
        return Err(e);
    }

    info!(
        client_id = %request.client_id,
        target_language = %request.target_language,
        chars = request.text.chars().count(),
        pending = queue.pending(),
        "Job admitted"
    );

    Ok(request)
}
