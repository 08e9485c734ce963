// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Snapshot {client_id} is terminal ({status}) and cannot change")]
    TerminalSnapshot { client_id: String, status: String },

    #[error("Packet progress overflow: {processed}/{total} already processed")]
    PacketOverflow { processed: usize, total: usize },

    #[error("Translation incomplete: {processed}/{total} packets processed")]
    IncompleteTranslation { processed: usize, total: usize },

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),

    #[error("Unknown pipeline phase: {0}")]
    UnknownPhase(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
