use crate::{MediaResult, OwnerContext};
use opentelemetry::trace::Status;
use std::{future::Future, time::Instant};
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone, Copy)]
pub enum MediaSpanMethod {
    Upload,
    Caption,
}

impl MediaSpanMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Caption => "caption",
        }
    }
}

pub struct MediaSpan {
    span: Span,
    start_time: Instant,
    ended: bool,
}

impl MediaSpan {
    pub fn new(endpoint: &str, method: MediaSpanMethod) -> Self {
        let span = match method {
            MediaSpanMethod::Upload => info_span!("portfolio_media.upload"),
            MediaSpanMethod::Caption => info_span!("portfolio_media.caption"),
        };
        span.set_attribute("portfolio_media.endpoint", endpoint.to_string());
        span.set_attribute("portfolio_media.method", method.as_str());

        Self {
            span,
            start_time: Instant::now(),
            ended: false,
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn set_attribute(&self, key: &'static str, value: String) {
        self.span.set_attribute(key, value);
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.span.set_attribute(
            "portfolio_media.duration_seconds",
            self.start_time.elapsed().as_secs_f64(),
        );
    }
}

impl Drop for MediaSpan {
    fn drop(&mut self) {
        self.on_end();
    }
}

pub async fn trace_upload<F, Fut>(
    endpoint: &str,
    owner_context: &OwnerContext,
    file_name: &str,
    size: u64,
    f: F,
) -> MediaResult<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = MediaResult<String>>,
{
    let mut span = MediaSpan::new(endpoint, MediaSpanMethod::Upload);
    span.set_attribute("portfolio_media.owner_context", owner_context.to_string());
    span.set_attribute("portfolio_media.file.name", file_name.to_string());
    span.set_attribute("portfolio_media.file.size", size.to_string());

    let result = span.instrument_future(f()).await;

    match &result {
        Ok(url) => span.set_attribute("portfolio_media.url", url.clone()),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}

pub async fn trace_caption<F, Fut, T>(endpoint: &str, image_url: &str, f: F) -> MediaResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = MediaResult<T>>,
{
    let mut span = MediaSpan::new(endpoint, MediaSpanMethod::Caption);
    span.set_attribute("portfolio_media.image_url", image_url.to_string());

    let result = span.instrument_future(f()).await;

    if let Err(error) = &result {
        span.on_error(error);
    }

    span.on_end();
    result
}
