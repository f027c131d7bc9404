use thiserror::Error;

/// Failures of a single exchange with the generation service.
///
/// The `Display` text of each variant is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("API Key is missing. Please configure it in settings.")]
    AuthMissing,
    #[error("Unauthorized: Invalid API Key.")]
    Unauthorized,
    #[error("Validation Error: Please check your prompt or seed.")]
    ValidationError,
    #[error("{0}")]
    ServiceError(String),
    #[error("Network error: {0}")]
    TransportError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("API Key must not be empty")]
    InvalidCredential,
    #[error("No history record with id {0}")]
    NotFound(String),
    #[error("Could not decode image payload: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AppError>;
