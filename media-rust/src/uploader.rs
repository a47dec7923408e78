use crate::{
    client_utils, opentelemetry::trace_upload, AssetFile, MediaError, MediaResult, OwnerContext,
};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use std::collections::HashMap;

const ENDPOINT: &str = "upload";
const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const UPLOAD_PATH: &str = "upload-image";

/// Stores a file and returns the URL it is served from.
///
/// Each call is at-most-once: implementations must not retry, and a failure
/// is terminal for that attempt.
#[async_trait::async_trait]
pub trait AssetUploader: Send + Sync {
    fn endpoint(&self) -> &'static str;
    /// Upload `file` on behalf of `owner_context`. `previous_url` is the URL
    /// being replaced, so the storage backend may clean it up.
    async fn upload(
        &self,
        file: AssetFile,
        owner_context: &OwnerContext,
        previous_url: Option<&str>,
    ) -> MediaResult<String>;
}

/// Uploads files to an HTTP endpoint as `multipart/form-data`.
pub struct HttpAssetUploader {
    url: String,
    api_key: Option<String>,
    headers: HashMap<String, String>,
    client: Client,
}

#[derive(Clone, Default)]
pub struct HttpAssetUploaderOptions {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl HttpAssetUploaderOptions {
    /// Read `PORTFOLIO_MEDIA_BASE_URL` and `PORTFOLIO_MEDIA_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PORTFOLIO_MEDIA_BASE_URL").ok(),
            api_key: std::env::var("PORTFOLIO_MEDIA_API_KEY").ok(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

impl HttpAssetUploader {
    #[must_use]
    pub fn new(options: HttpAssetUploaderOptions) -> Self {
        let HttpAssetUploaderOptions {
            base_url,
            api_key,
            headers,
            client,
        } = options;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            url: client_utils::endpoint_url(&base_url, UPLOAD_PATH),
            api_key,
            headers: headers.unwrap_or_default(),
            client: client.unwrap_or_else(Client::new),
        }
    }

    fn build_form(
        file: AssetFile,
        owner_context: &OwnerContext,
        previous_url: Option<&str>,
    ) -> MediaResult<Form> {
        let AssetFile {
            name,
            mime_type,
            bytes,
        } = file;

        let part = Part::bytes(bytes)
            .file_name(name)
            .mime_str(&mime_type)
            .map_err(|error| {
                MediaError::InvalidInput(format!("Invalid MIME type '{mime_type}': {error}"))
            })?;

        let mut form = Form::new()
            .part("file", part)
            .text("projectId", owner_context.to_string());
        if let Some(previous_url) = previous_url {
            form = form.text("oldImageUrl", previous_url.to_string());
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl AssetUploader for HttpAssetUploader {
    fn endpoint(&self) -> &'static str {
        ENDPOINT
    }

    async fn upload(
        &self,
        file: AssetFile,
        owner_context: &OwnerContext,
        previous_url: Option<&str>,
    ) -> MediaResult<String> {
        let file_name = file.name.clone();
        let size = file.size();

        trace_upload(ENDPOINT, owner_context, &file_name, size, || async move {
            let form = Self::build_form(file, owner_context, previous_url)?;
            let headers =
                client_utils::build_headers(ENDPOINT, self.api_key.as_deref(), &self.headers)?;

            let response: UploadResponse =
                client_utils::send_multipart(&self.client, &self.url, form, headers).await?;

            response
                .url
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| {
                    MediaError::Invariant(ENDPOINT, "No URL in upload response".to_string())
                })
        })
        .await
    }
}
