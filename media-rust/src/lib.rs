mod caption;
mod client_utils;
mod errors;
pub mod media_test;
mod opentelemetry;
mod types;
mod uploader;
mod validator;

pub use caption::{
    normalize_caption, CaptionGenerator, HttpCaptionGenerator, HttpCaptionGeneratorOptions,
};
pub use errors::*;
pub use types::*;
pub use uploader::{AssetUploader, HttpAssetUploader, HttpAssetUploaderOptions};
pub use validator::{UploadValidator, DEFAULT_MAX_UPLOAD_BYTES};
