use crate::{errors::MIB, AssetFile, ValidationError};

/// Largest accepted upload, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * MIB;

/// Gates a user-selected file on type and size before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadValidator {
    max_bytes: u64,
    accepted_prefix: String,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            accepted_prefix: "image/".to_string(),
        }
    }
}

impl UploadValidator {
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check the file. Type is checked before size so that a large non-image
    /// is reported as the wrong type.
    pub fn validate(&self, file: &AssetFile) -> Result<(), ValidationError> {
        let mime_type = file.mime_type.trim().to_ascii_lowercase();
        if !mime_type.starts_with(&self.accepted_prefix) {
            return Err(ValidationError::UnsupportedType {
                mime_type: file.mime_type.clone(),
            });
        }

        let size = file.size();
        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}
