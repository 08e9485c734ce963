//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use transflow_core::domain::{ClientId, JobSnapshot};

/// translation.submit.v1 - params are the submission fields; absent ones are reported
pub use transflow_core::application::SubmitRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub client_id: String,
    pub status: String,
}

/// translation.status.v1 - result is the full [`JobSnapshot`]
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub client_id: String,
}

/// translation.list.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub count: usize,
    pub translations: BTreeMap<ClientId, JobSnapshot>,
}

/// translation.queue.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusResponse {
    pub status_message: String,
    pub pending: usize,
    pub in_flight: Vec<ClientId>,
}

/// admin.stats.v1 - Get system statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: i64,
    pub queued: i64,
    pub processing: i64,
    pub completed: i64,
    pub error: i64,
    pub pending: usize,
    pub uptime_seconds: i64,
}
