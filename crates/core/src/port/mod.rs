// Port Layer - Interfaces for external dependencies

pub mod log_sink;
pub mod snapshot_store;
pub mod stage;
pub mod time_provider;
pub mod translation_provider;

// Re-exports
pub use log_sink::{LogSink, LogSinkError};
pub use snapshot_store::SnapshotStore;
pub use stage::{
    ReverseTransform, SecondaryTranslationStage, StageError, StageErrorCode, TransformStage,
};
pub use time_provider::TimeProvider;
pub use translation_provider::{ProviderError, TranslationProvider};
