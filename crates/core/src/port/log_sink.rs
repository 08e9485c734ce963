// Log Sink Port
// Best-effort notification channel; failures never affect job status

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogSinkError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Log sink returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn notify(&self, client_id: &str, message: &str) -> Result<(), LogSinkError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records notifications; optionally fails every call after recording it
    #[derive(Default)]
    pub struct RecordingLogSink {
        messages: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingLogSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        /// `(client_id, message)` pairs in call order
        pub fn messages(&self) -> Vec<(String, String)> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogSink for RecordingLogSink {
        async fn notify(&self, client_id: &str, message: &str) -> Result<(), LogSinkError> {
            self.messages
                .lock()
                .unwrap()
                .push((client_id.to_string(), message.to_string()));
            if self.fail {
                return Err(LogSinkError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }
}
