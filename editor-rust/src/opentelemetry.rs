use opentelemetry::trace::Status;
use portfolio_media::OwnerContext;
use std::{error::Error, future::Future};
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone, Copy)]
pub enum PipelineSpanMethod {
    Replace,
    GenerateCaption,
}

impl PipelineSpanMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::GenerateCaption => "generate_caption",
        }
    }
}

pub struct PipelineSpan {
    span: Span,
}

impl PipelineSpan {
    pub fn new(method: PipelineSpanMethod, project_id: &OwnerContext, image_url: &str) -> Self {
        let span = match method {
            PipelineSpanMethod::Replace => info_span!("portfolio_editor.replace"),
            PipelineSpanMethod::GenerateCaption => {
                info_span!("portfolio_editor.generate_caption")
            }
        };
        span.set_attribute("portfolio_editor.method", method.as_str());
        span.set_attribute("portfolio_editor.project_id", project_id.to_string());
        span.set_attribute("portfolio_editor.image_url", image_url.to_string());

        Self { span }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn on_error(&self, error: &(dyn Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }
}

/// Run `future` inside a pipeline span, recording a failure on the span.
pub async fn trace_pipeline<Fut, T, E>(
    method: PipelineSpanMethod,
    project_id: &OwnerContext,
    image_url: &str,
    future: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    let span = PipelineSpan::new(method, project_id, image_url);
    let result = future.instrument(span.span()).await;

    if let Err(error) = &result {
        span.on_error(error);
    }
    result
}
