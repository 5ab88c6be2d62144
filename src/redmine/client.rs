//! Redmine Client
//!
//! Entry point combining the HTTP transport with the per-resource APIs.

use super::custom_fields::CustomFields;
use super::http::RedmineHttpClient;
use super::projects::Projects;
use super::transport::TransportError;
use crate::resource::DEFAULT_PAGE_SIZE;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Main Redmine client
#[derive(Clone)]
pub struct RedmineClient {
    pub http: RedmineHttpClient,
    pub page_size: u64,
}

impl RedmineClient {
    /// Create a new client for the server at `url`
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, TransportError> {
        Self::with_timeout(url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            http: RedmineHttpClient::new(url, api_key, timeout)?,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Project API with its own listing cache
    pub fn projects(&self) -> Projects<RedmineHttpClient> {
        Projects::new(self.http.clone()).with_page_size(self.page_size)
    }

    /// Custom field API with its own listing cache
    pub fn custom_fields(&self) -> CustomFields<RedmineHttpClient> {
        CustomFields::new(self.http.clone()).with_page_size(self.page_size)
    }
}
