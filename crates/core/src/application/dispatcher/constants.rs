// Dispatcher constants (no magic values)
use std::time::Duration;

/// Characters per translation packet
pub const DEFAULT_PACKET_SIZE: usize = 1024;

/// Fixed delay before the first external call of each job (rate limiting / warm-up)
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(45);

/// Advisory `time_remaining` stored when a job starts (seconds)
pub const DEFAULT_INITIAL_TIME_REMAINING_SECS: i64 = 45;

/// Single sequential worker
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Status message while at least one job is in flight
pub const STATUS_PROCESSING: &str = "Processing translation";

/// Status message while no job is in flight
pub const STATUS_IDLE: &str = "Queue is empty";

/// Notification sent to the log sink after both stages succeed
pub fn completion_message(client_id: &str) -> String {
    format!("Translation completed for client {}", client_id)
}
