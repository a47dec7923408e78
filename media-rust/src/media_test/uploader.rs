use std::{collections::VecDeque, sync::Mutex};

use futures::channel::oneshot;

use crate::{AssetFile, AssetUploader, MediaError, MediaResult, OwnerContext};

/// Result for a mocked `upload` call.
pub enum MockUploadResult {
    Url(String),
    Error(MediaError),
    /// Hold the call open until the paired sender resolves it. Used to
    /// observe state while an upload is in flight.
    Deferred(oneshot::Receiver<MediaResult<String>>),
}

impl MockUploadResult {
    /// Construct a result that yields the provided URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Construct a result that yields the provided error.
    pub fn error(error: MediaError) -> Self {
        Self::Error(error)
    }

    /// Construct a result that resolves when the returned sender is used.
    pub fn deferred() -> (Self, oneshot::Sender<MediaResult<String>>) {
        let (sender, receiver) = oneshot::channel();
        (Self::Deferred(receiver), sender)
    }
}

impl From<&str> for MockUploadResult {
    fn from(url: &str) -> Self {
        Self::url(url)
    }
}

impl From<MediaResult<String>> for MockUploadResult {
    fn from(result: MediaResult<String>) -> Self {
        match result {
            Ok(url) => Self::Url(url),
            Err(error) => Self::Error(error),
        }
    }
}

/// A recorded `upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedUpload {
    pub file: AssetFile,
    pub owner_context: OwnerContext,
    pub previous_url: Option<String>,
}

#[derive(Default)]
struct MockUploaderState {
    mocked_results: VecDeque<MockUploadResult>,
    tracked_uploads: Vec<TrackedUpload>,
}

/// A mock uploader for testing that tracks inputs and yields predefined
/// outputs.
#[derive(Default)]
pub struct MockAssetUploader {
    state: Mutex<MockUploaderState>,
}

impl MockAssetUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a single mocked upload result.
    pub fn enqueue<R>(&self, result: R) -> &Self
    where
        R: Into<MockUploadResult>,
    {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.push_back(result.into());
        drop(state);
        self
    }

    /// Retrieve the uploads made so far.
    pub fn tracked_uploads(&self) -> Vec<TrackedUpload> {
        let state = self.state.lock().expect("mock state poisoned");
        state.tracked_uploads.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock state poisoned")
            .tracked_uploads
            .len()
    }

    /// Clear both tracked inputs and enqueued results.
    pub fn restore(&self) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.clear();
        state.tracked_uploads.clear();
    }
}

#[async_trait::async_trait]
impl AssetUploader for MockAssetUploader {
    fn endpoint(&self) -> &'static str {
        "mock"
    }

    async fn upload(
        &self,
        file: AssetFile,
        owner_context: &OwnerContext,
        previous_url: Option<&str>,
    ) -> MediaResult<String> {
        let result = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.tracked_uploads.push(TrackedUpload {
                file,
                owner_context: owner_context.clone(),
                previous_url: previous_url.map(str::to_string),
            });
            state.mocked_results.pop_front().ok_or_else(|| {
                MediaError::Invariant("mock", "no mocked upload results available".into())
            })?
        };

        match result {
            MockUploadResult::Url(url) => Ok(url),
            MockUploadResult::Error(error) => Err(error),
            MockUploadResult::Deferred(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(MediaError::Invariant(
                    "mock",
                    "deferred upload sender dropped".into(),
                ))
            }),
        }
    }
}
