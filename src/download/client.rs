//! HTTP client wrapper for the page, robots.txt and image requests.
//!
//! One [`HttpClient`] is built per run; its timeout applies uniformly to every
//! request it issues.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use url::Url;

use super::error::FetchError;
use crate::user_agent;

/// Result of fetching the target page.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Final URL after redirects; relative references resolve against it.
    pub url: Url,
    /// Decoded HTML body.
    pub html: String,
    /// HTTP status code (always 2xx).
    pub status: u16,
}

/// Body of a successfully fetched image.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Raw response bytes.
    pub bytes: Vec<u8>,
    /// Declared Content-Type, if any.
    pub content_type: Option<String>,
}

impl FetchedBody {
    /// Whether the server declared an image (or generic binary) payload.
    #[must_use]
    pub fn declares_image(&self) -> bool {
        self.content_type.as_deref().is_none_or(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime.is_empty() || mime.starts_with("image/") || mime == "application/octet-stream"
        })
    }
}

/// HTTP client with a fixed per-request timeout and identifying User-Agent.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Creates a client with the default User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, &user_agent::default_user_agent())
    }

    /// Creates a client sending a custom User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built.
    #[instrument(level = "debug", skip(timeout), fields(timeout_ms = timeout.as_millis()))]
    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::client)?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    /// The User-Agent header this client sends.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetches the target page as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on an invalid URL, network failure, timeout, or
    /// non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<PageResult, FetchError> {
        let parsed = parse_http_url(url)?;
        let response = self.send(&parsed).await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        debug!(status, bytes = html.len(), final_url = %final_url, "fetched page");
        Ok(PageResult {
            url: final_url,
            html,
            status,
        })
    }

    /// Fetches an image body into memory.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &Url) -> Result<FetchedBody, FetchError> {
        let response = self.send(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::with_capacity(
            response
                .content_length()
                .and_then(|len| usize::try_from(len).ok())
                .unwrap_or(0),
        );
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url.as_str(), e))?;
            bytes.extend_from_slice(&chunk);
        }

        debug!(bytes = bytes.len(), content_type = ?content_type, "fetched image");
        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }

    /// Fetches a text resource, mapping non-2xx responses to errors.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or non-2xx status.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.send(url).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

/// Parses an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] for anything else.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|_| FetchError::invalid_url(url))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(FetchError::invalid_url(url));
    }
    Ok(parsed)
}
