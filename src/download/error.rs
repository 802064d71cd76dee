//! Error types for the fetch and download stages.
//!
//! [`FetchError`] covers every outbound HTTP request (the target page and each
//! candidate image); [`FilesystemError`] covers the output directory.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    /// Malformed, or a scheme other than http(s).
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// DNS, connect, TLS or mid-body transport failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Any final status outside 200-299.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The server declared a non-image Content-Type.
    #[error("not an image ({content_type}) at {url}")]
    NotAnImage { url: String, content_type: String },
}

impl FetchError {
    /// Creates a client construction error.
    pub fn client(source: reqwest::Error) -> Self {
        Self::Client { source }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error, promoting reqwest timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a not-an-image error.
    pub fn not_an_image(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::NotAnImage {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Short machine-friendly label used in run reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client { .. } => "client",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::NotAnImage { .. } => "not_an_image",
        }
    }
}

/// Errors touching the local output directory.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// The output directory could not be created or listed. Fatal for a run.
    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One image could not be written; the run carries on.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilesystemError {
    /// Creates an output directory error.
    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a per-file write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path the source error does not carry.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://example.com/a.png");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/a.png"));
        assert_eq!(error.kind(), "timeout");
    }

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://example.com/a.png", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/a.png"), "Expected URL in: {msg}");
        assert_eq!(error.kind(), "http_status");
    }

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let msg = FetchError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_fetch_error_not_an_image_display() {
        let error = FetchError::not_an_image("https://example.com/x", "text/html");
        let msg = error.to_string();
        assert!(msg.contains("text/html"), "Expected content type in: {msg}");
        assert_eq!(error.kind(), "not_an_image");
    }

    #[test]
    fn test_filesystem_error_write_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let msg = FilesystemError::write(PathBuf::from("/tmp/out/a.png"), io_error).to_string();
        assert!(msg.contains("/tmp/out/a.png"), "Expected path in: {msg}");
    }

    #[test]
    fn test_filesystem_error_output_dir_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let msg = FilesystemError::output_dir("/root/forbidden", io_error).to_string();
        assert!(msg.contains("output directory"), "unexpected: {msg}");
        assert!(msg.contains("/root/forbidden"), "unexpected: {msg}");
    }
}
