//! Error types for the event bus

/// Raised by a handler method; surfaces through the broadcast unchanged.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Argument {index} is not a {expected}")]
    ArgumentMismatch {
        index: usize,
        expected: &'static str,
    },

    #[error("Handler instance is not a {0}")]
    InstanceMismatch(&'static str),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Errors produced while building or invoking a broadcast proxy
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event contract {contract}: {reason}")]
    InvalidContract { contract: String, reason: String },

    #[error("Contract {contract} has no method `{method}`")]
    UnknownMethod { contract: String, method: String },

    #[error("Method {contract}::{method} takes {expected} arguments, got {actual}")]
    ArityMismatch {
        contract: String,
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {index} of {contract}::{method} is not a {expected}")]
    ArgumentMismatch {
        contract: String,
        method: String,
        index: usize,
        expected: String,
    },

    #[error("Handler {handler} failed in `{method}`")]
    Handler {
        handler: &'static str,
        method: String,
        #[source]
        source: HandlerError,
    },

    #[error("Return value of {contract}::{method} is not a {expected}")]
    ReturnTypeMismatch {
        contract: String,
        method: String,
        expected: &'static str,
    },

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ductile_core::Error),
}

impl EventError {
    pub(crate) fn invalid(contract: &str, reason: impl Into<String>) -> Self {
        EventError::InvalidContract {
            contract: contract.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors produced while loading [`EventsConfig`](crate::EventsConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
