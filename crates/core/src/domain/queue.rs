// Queue Domain Model

use crate::domain::job::{ClientId, JobSnapshot};
use serde::{Deserialize, Serialize};

/// An admitted translation request waiting for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub client_id: ClientId,
    pub text: String,
    pub target_language: String,
}

impl JobRequest {
    pub fn new(
        client_id: impl Into<String>,
        text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            text: text.into(),
            target_language: target_language.into(),
        }
    }

    /// Snapshot a job starts from before the dispatcher picks it up
    pub fn queued_snapshot(&self) -> JobSnapshot {
        JobSnapshot::queued(&self.client_id, &self.text, &self.target_language)
    }
}
