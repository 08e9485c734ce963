// Auxiliary Stage Ports
// Post-processing steps applied to the fully assembled translation

use async_trait::async_trait;
use thiserror::Error;

/// Distinguished failure codes reported by a remote stage.
///
/// Numeric values follow the canonical RPC status numbering used by the
/// secondary-translation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorCode {
    /// Input was rejected (e.g. empty text)
    InvalidArgument,
    /// The service failed while processing valid input
    Internal,
    /// Any other code, preserved verbatim
    Unknown(i32),
}

impl StageErrorCode {
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const INTERNAL: i32 = 13;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::INVALID_ARGUMENT => StageErrorCode::InvalidArgument,
            Self::INTERNAL => StageErrorCode::Internal,
            other => StageErrorCode::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            StageErrorCode::InvalidArgument => Self::INVALID_ARGUMENT,
            StageErrorCode::Internal => Self::INTERNAL,
            StageErrorCode::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for StageErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            StageErrorCode::Internal => write!(f, "INTERNAL"),
            StageErrorCode::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// Stage errors (transform or secondary translation)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Stage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed stage response: {0}")]
    InvalidResponse(String),

    #[error("Stage rejected request [{code}]: {message}")]
    Rejected {
        code: StageErrorCode,
        message: String,
    },
}

/// Stage A: deterministic text transform
#[async_trait]
pub trait TransformStage: Send + Sync {
    async fn transform(&self, text: &str) -> Result<String, StageError>;
}

/// Stage B: secondary translation over a remote procedure interface
#[async_trait]
pub trait SecondaryTranslationStage: Send + Sync {
    async fn retranslate(&self, text: &str) -> Result<String, StageError>;
}

/// Reference transform: reverses character order (its own inverse)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseTransform;

impl ReverseTransform {
    pub fn apply(text: &str) -> String {
        text.chars().rev().collect()
    }
}

#[async_trait]
impl TransformStage for ReverseTransform {
    async fn transform(&self, text: &str) -> Result<String, StageError> {
        Ok(Self::apply(text))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock stage behavior
    #[derive(Debug, Clone)]
    pub enum MockStageBehavior {
        /// Reverse the input
        Reverse,
        /// Return the input unchanged
        Echo,
        /// Always fail with this error
        Fail(StageError),
    }

    /// Mock stage usable as either Stage A or Stage B
    pub struct MockStage {
        behavior: MockStageBehavior,
        inputs: Mutex<Vec<String>>,
    }

    impl MockStage {
        pub fn new(behavior: MockStageBehavior) -> Self {
            Self {
                behavior,
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn reverse() -> Self {
            Self::new(MockStageBehavior::Reverse)
        }

        pub fn echo() -> Self {
            Self::new(MockStageBehavior::Echo)
        }

        pub fn failing(error: StageError) -> Self {
            Self::new(MockStageBehavior::Fail(error))
        }

        pub fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.inputs.lock().unwrap().len()
        }

        fn run(&self, text: &str) -> Result<String, StageError> {
            self.inputs.lock().unwrap().push(text.to_string());
            match &self.behavior {
                MockStageBehavior::Reverse => Ok(ReverseTransform::apply(text)),
                MockStageBehavior::Echo => Ok(text.to_string()),
                MockStageBehavior::Fail(error) => Err(error.clone()),
            }
        }
    }

    #[async_trait]
    impl TransformStage for MockStage {
        async fn transform(&self, text: &str) -> Result<String, StageError> {
            self.run(text)
        }
    }

    #[async_trait]
    impl SecondaryTranslationStage for MockStage {
        async fn retranslate(&self, text: &str) -> Result<String, StageError> {
            self.run(text)
        }
    }
}
