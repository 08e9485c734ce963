// Dispatcher configuration

use super::constants::*;
use crate::error::{AppError, Result};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Characters per packet (must be > 0)
    pub packet_size: usize,
    /// Wait before the first external call of every job
    pub startup_delay: Duration,
    /// Advisory estimate stored in `time_remaining` at job start
    pub initial_time_remaining_secs: i64,
    /// Workers sharing the queue. Only `1` keeps jobs strictly sequential.
    pub worker_count: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            startup_delay: DEFAULT_STARTUP_DELAY,
            initial_time_remaining_secs: DEFAULT_INITIAL_TIME_REMAINING_SECS,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.packet_size == 0 {
            return Err(AppError::Config(
                "dispatcher.packet_size must be greater than zero".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(AppError::Config(
                "dispatcher.worker_count must be greater than zero".to_string(),
            ));
        }
        if self.initial_time_remaining_secs < 0 {
            return Err(AppError::Config(
                "dispatcher.initial_time_remaining_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
