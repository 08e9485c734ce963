// Application Layer - Use Cases and the dispatch pipeline

pub mod dispatcher;
pub mod queue;
pub mod status;
pub mod submission;

// Re-exports
pub use dispatcher::{Dispatcher, DispatcherActivity, DispatcherConfig, PipelinePorts};
pub use queue::{job_queue, QueueReceiver, QueueSender};
pub use status::{StatusCounts, StatusService};
pub use submission::{SubmissionService, SubmitRequest};
