use portfolio_media::{MediaError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    /// The file was rejected before any upload was attempted.
    #[error("Validation error: {0}")]
    Validation(ValidationError),
    /// An external collaborator failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
    #[error("An upload is already in progress for this image")]
    UploadInProgress,
    #[error("This image does not allow the \"{0}\" action")]
    CapabilityDenied(&'static str),
    #[error("The image cannot be interacted with: {0}")]
    NotInteractive(&'static str),
    /// The instance was unmounted before the operation resolved; the result
    /// was discarded.
    #[error("The image instance is no longer mounted")]
    Unmounted,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
}

impl From<ValidationError> for EditorError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}
