// Dispatcher activity, published through a watch channel

use super::constants::{STATUS_IDLE, STATUS_PROCESSING};
use crate::domain::ClientId;

/// Jobs currently inside the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherActivity {
    pub in_flight: Vec<ClientId>,
}

impl DispatcherActivity {
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Human-readable queue state given the number of jobs still waiting
    pub fn status_message(&self, pending: usize) -> &'static str {
        if self.is_idle() && pending == 0 {
            STATUS_IDLE
        } else {
            STATUS_PROCESSING
        }
    }

    pub(super) fn begin(&mut self, client_id: &str) {
        self.in_flight.push(client_id.to_string());
    }

    // Removes a single entry: duplicate ids may be in flight with several workers
    pub(super) fn finish(&mut self, client_id: &str) {
        if let Some(pos) = self.in_flight.iter().position(|id| id == client_id) {
            self.in_flight.remove(pos);
        }
    }
}
