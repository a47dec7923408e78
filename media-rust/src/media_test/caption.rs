use std::{collections::VecDeque, sync::Mutex};

use futures::channel::oneshot;

use crate::{CaptionGenerator, CaptionRequest, CaptionResponse, MediaError, MediaResult};

/// Result for a mocked `generate` call.
pub enum MockCaptionResult {
    Caption(String),
    Error(MediaError),
    Deferred(oneshot::Receiver<MediaResult<CaptionResponse>>),
}

impl MockCaptionResult {
    /// Construct a result that yields the provided caption.
    pub fn caption(caption: impl Into<String>) -> Self {
        Self::Caption(caption.into())
    }

    /// Construct a result that yields the provided error.
    pub fn error(error: MediaError) -> Self {
        Self::Error(error)
    }

    /// Construct a result that resolves when the returned sender is used.
    pub fn deferred() -> (Self, oneshot::Sender<MediaResult<CaptionResponse>>) {
        let (sender, receiver) = oneshot::channel();
        (Self::Deferred(receiver), sender)
    }
}

impl From<&str> for MockCaptionResult {
    fn from(caption: &str) -> Self {
        Self::caption(caption)
    }
}

#[derive(Default)]
struct MockCaptionState {
    mocked_results: VecDeque<MockCaptionResult>,
    tracked_requests: Vec<CaptionRequest>,
}

/// A mock caption generator for testing that tracks inputs and yields
/// predefined outputs.
#[derive(Default)]
pub struct MockCaptionGenerator {
    state: Mutex<MockCaptionState>,
}

impl MockCaptionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a single mocked generate result.
    pub fn enqueue<R>(&self, result: R) -> &Self
    where
        R: Into<MockCaptionResult>,
    {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.push_back(result.into());
        drop(state);
        self
    }

    /// Retrieve the requests made so far.
    pub fn tracked_requests(&self) -> Vec<CaptionRequest> {
        let state = self.state.lock().expect("mock state poisoned");
        state.tracked_requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock state poisoned")
            .tracked_requests
            .len()
    }
}

#[async_trait::async_trait]
impl CaptionGenerator for MockCaptionGenerator {
    fn endpoint(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: CaptionRequest) -> MediaResult<CaptionResponse> {
        let result = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.tracked_requests.push(request);
            state.mocked_results.pop_front().ok_or_else(|| {
                MediaError::Invariant("mock", "no mocked caption results available".into())
            })?
        };

        match result {
            MockCaptionResult::Caption(caption) => Ok(CaptionResponse { caption }),
            MockCaptionResult::Error(error) => Err(error),
            MockCaptionResult::Deferred(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(MediaError::Invariant(
                    "mock",
                    "deferred caption sender dropped".into(),
                ))
            }),
        }
    }
}
