// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod packet;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use job::{ClientId, JobSnapshot, JobStatus, PipelinePhase};
pub use packet::Packetizer;
pub use queue::JobRequest;
