use crate::{
    client_utils, opentelemetry::trace_caption, CaptionRequest, CaptionResponse, MediaResult,
};
use reqwest::Client;
use std::collections::HashMap;

const ENDPOINT: &str = "caption";
const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const CAPTION_PATH: &str = "generate-caption";

/// Produces a short description for an image.
#[async_trait::async_trait]
pub trait CaptionGenerator: Send + Sync {
    fn endpoint(&self) -> &'static str;
    async fn generate(&self, request: CaptionRequest) -> MediaResult<CaptionResponse>;
}

/// Requests captions from an HTTP endpoint that accepts
/// `{ "imageUrl", "context" }` and answers `{ "caption" }`.
pub struct HttpCaptionGenerator {
    url: String,
    api_key: Option<String>,
    headers: HashMap<String, String>,
    client: Client,
}

#[derive(Clone, Default)]
pub struct HttpCaptionGeneratorOptions {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl HttpCaptionGeneratorOptions {
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

impl HttpCaptionGenerator {
    #[must_use]
    pub fn new(options: HttpCaptionGeneratorOptions) -> Self {
        let HttpCaptionGeneratorOptions {
            base_url,
            api_key,
            headers,
            client,
        } = options;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            url: client_utils::endpoint_url(&base_url, CAPTION_PATH),
            api_key,
            headers: headers.unwrap_or_default(),
            client: client.unwrap_or_else(Client::new),
        }
    }
}

#[async_trait::async_trait]
impl CaptionGenerator for HttpCaptionGenerator {
    fn endpoint(&self) -> &'static str {
        ENDPOINT
    }

    async fn generate(&self, request: CaptionRequest) -> MediaResult<CaptionResponse> {
        let image_url = request.image_url.clone();
        trace_caption(ENDPOINT, &image_url, || async move {
            let headers =
                client_utils::build_headers(ENDPOINT, self.api_key.as_deref(), &self.headers)?;
            client_utils::send_json(&self.client, &self.url, &request, headers).await
        })
        .await
    }
}

/// Reduce raw model output to a single sentence.
///
/// The text is trimmed, wrapping quotes are removed, and everything after the
/// first `.`, `!` or `?` is dropped. A period is appended when the sentence
/// has no terminal punctuation. Returns `None` when nothing is left.
#[must_use]
pub fn normalize_caption(raw: &str) -> Option<String> {
    let text = strip_wrapping_quotes(raw.trim()).trim();
    if text.is_empty() {
        return None;
    }

    let sentence = match text.find(&['.', '!', '?'][..]) {
        Some(end) => text[..=end].trim().to_string(),
        None => format!("{text}."),
    };

    // A lone punctuation mark is not a caption.
    if sentence.chars().all(|c| !c.is_alphanumeric()) {
        return None;
    }
    Some(sentence)
}

fn strip_wrapping_quotes(text: &str) -> &str {
    const QUOTES: [(char, char); 3] = [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')];
    for (open, close) in QUOTES {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    text
}
