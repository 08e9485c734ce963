// Translation Provider Port
// Abstraction over the external machine-translation service

use async_trait::async_trait;
use thiserror::Error;

/// Translation provider errors. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Translates one packet of text into `target_language`.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock provider behavior
    #[derive(Debug, Clone)]
    pub enum MockProviderBehavior {
        /// Uppercase every packet
        Uppercase,
        /// Uppercase, but fail on the packet with this zero-based index
        FailAt { index: usize, error: ProviderError },
    }

    /// Mock Translation Provider recording every packet it receives
    pub struct MockTranslationProvider {
        behavior: MockProviderBehavior,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockTranslationProvider {
        pub fn new(behavior: MockProviderBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn uppercase() -> Self {
            Self::new(MockProviderBehavior::Uppercase)
        }

        pub fn failing_at(index: usize, error: ProviderError) -> Self {
            Self::new(MockProviderBehavior::FailAt { index, error })
        }

        /// `(packet, target_language)` pairs in call order
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TranslationProvider for MockTranslationProvider {
        async fn translate(
            &self,
            text: &str,
            target_language: &str,
        ) -> Result<String, ProviderError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((text.to_string(), target_language.to_string()));
                calls.len() - 1
            };

            match &self.behavior {
                MockProviderBehavior::FailAt { index: at, error } if *at == index => {
                    Err(error.clone())
                }
                _ => Ok(text.to_uppercase()),
            }
        }
    }
}
