//! Mock collaborators for tests. They track inputs and yield predefined
//! outputs in the order they were enqueued.

mod caption;
mod uploader;

pub use caption::{MockCaptionGenerator, MockCaptionResult};
pub use uploader::{MockAssetUploader, MockUploadResult, TrackedUpload};
