use crate::MediaError;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    multipart::Form,
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

/// Create a JSON request, parse the response.
/// Throws error on non OK status code.
pub async fn send_json<T: Serialize, R: DeserializeOwned>(
    client: &Client,
    url: &str,
    data: &T,
    headers: HeaderMap,
) -> Result<R, MediaError> {
    let response = client.post(url).headers(headers).json(data).send().await?;
    parse_json(response).await
}

/// Create a multipart request, parse the JSON response.
/// Throws error on non OK status code.
pub async fn send_multipart<R: DeserializeOwned>(
    client: &Client,
    url: &str,
    form: Form,
    headers: HeaderMap,
) -> Result<R, MediaError> {
    let response = client
        .post(url)
        .headers(headers)
        .multipart(form)
        .send()
        .await?;
    parse_json(response).await
}

async fn parse_json<R: DeserializeOwned>(response: Response) -> Result<R, MediaError> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<R>().await?)
    } else {
        Err(MediaError::StatusCode(
            status,
            response.text().await.unwrap_or_default(),
        ))
    }
}

/// Build request headers from an optional bearer token and extra headers.
pub fn build_headers(
    endpoint: &'static str,
    api_key: Option<&str>,
    extra: &HashMap<String, String>,
) -> Result<HeaderMap, MediaError> {
    let mut headers = HeaderMap::new();

    if let Some(api_key) = api_key {
        let auth_header = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|error| {
            MediaError::InvalidInput(format!("Invalid {endpoint} API key header value: {error}"))
        })?;
        headers.insert(header::AUTHORIZATION, auth_header);
    }

    for (key, value) in extra {
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
            MediaError::InvalidInput(format!("Invalid {endpoint} header name '{key}': {error}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|error| {
            MediaError::InvalidInput(format!(
                "Invalid {endpoint} header value for '{key}': {error}"
            ))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Join a base URL and a path without doubling slashes.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
