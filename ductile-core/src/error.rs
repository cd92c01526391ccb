// Error types for the Ductile resolver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Dependency injection error: {0}")]
    DependencyInjection(String),

    #[error("Type mismatch: {registration} does not produce {expected}")]
    TypeMismatch {
        expected: &'static str,
        registration: String,
    },

    #[error("Factory for {provider} failed: {message}")]
    Factory {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Registration source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Factory`] for the provider type `T`.
    pub fn factory<T: ?Sized + 'static>(message: impl Into<String>) -> Self {
        Error::Factory {
            provider: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
