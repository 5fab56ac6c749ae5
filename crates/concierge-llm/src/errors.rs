//! Error taxonomy for model client calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Misconfiguration detected before any provider is contacted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a provider adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("provider '{provider}' failed: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SDKError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SDKError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(error) if error.retryable)
    }
}
