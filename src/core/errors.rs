use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Invalid data: {0}")]
    TypesError(#[from] crate::core::types::TypesError),

    #[error("Connection manager for {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Connection manager for {0} has no metadata yet")]
    NotInitialized(String),
}
