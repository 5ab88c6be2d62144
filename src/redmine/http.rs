//! HTTP transport for the Redmine REST API

use super::transport::{Method, RawResponse, Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header Redmine reads the API key from
pub const API_KEY_HEADER: &str = "x-redmine-api-key";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP client wrapper for Redmine API calls
#[derive(Clone)]
pub struct RedmineHttpClient {
    client: Client,
    base_url: Url,
}

impl RedmineHttpClient {
    /// Create a new HTTP client for the server at `base_url`
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::Malformed(format!("invalid server URL {base_url:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| TransportError::Malformed("API key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let client = Client::builder()
            .user_agent(concat!("redmine-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a server-relative path (with query string) onto the base URL,
    /// keeping any sub-path the server is mounted under
    fn url_for(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

impl Transport for RedmineHttpClient {
    async fn perform(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<RawResponse, TransportError> {
        let url = self.url_for(path);
        tracing::debug!("{} {}", method, url);

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/xml")
                .body(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(RawResponse::new(status.as_u16(), body))
    }
}

/// Format a Redmine API error for display
pub fn format_redmine_error(error: &TransportError) -> String {
    match error.status() {
        Some(401) => return "Authentication failed. Check your API key.".to_string(),
        Some(403) => return "Permission denied for this resource.".to_string(),
        Some(404) => return "Resource not found.".to_string(),
        Some(422) => {
            if let TransportError::Status { body, .. } = error {
                if !body.is_empty() {
                    return format!("Server rejected the request: {}", body);
                }
            }
            return "Server rejected the request.".to_string();
        }
        Some(s) if s >= 500 => {
            return "Redmine server error. Please try again later.".to_string();
        }
        _ => {}
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| !c.is_control())
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
