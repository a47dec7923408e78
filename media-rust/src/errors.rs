use thiserror::Error;

/// A user-selected file was rejected before any network call was made.
/// Every message names the concrete constraint that was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type \"{mime_type}\": only image files can be uploaded")]
    UnsupportedType { mime_type: String },
    #[error(
        "File is {:.1} MiB; the maximum upload size is {} MiB",
        mebibytes(*size),
        max / MIB
    )]
    TooLarge { size: u64, max: u64 },
    #[error("File is empty")]
    Empty,
}

pub(crate) const MIB: u64 = 1024 * 1024;

#[allow(clippy::cast_precision_loss)]
fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request to the endpoint failed or the parsing of the response
    /// failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The request returns a non-OK status code
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
    /// The response from the endpoint was unexpected. (e.g. an upload
    /// response without a URL)
    #[error("Invariant from {0}: {1}")]
    Invariant(&'static str, String),
}

pub type MediaResult<T> = Result<T, MediaError>;
