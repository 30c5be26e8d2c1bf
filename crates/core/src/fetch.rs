//! Content fetching from URLs, files, and stdin.
//!
//! Network access goes through the [`Transport`] trait so the retrieval
//! pipeline can run against any HTTP client. [`HttpTransport`] is the
//! `reqwest` implementation, available with the `fetch` feature.

use std::fs;
use std::path::PathBuf;
#[cfg(feature = "fetch")]
use std::time::Duration;

use url::Url;

use crate::{GleanerError, Result};

/// Browser-like User-Agent sent on direct requests.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client configuration for fetching web pages.
///
/// This struct controls timeout and user agent settings for direct requests.
/// Relays receive their own fixed headers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-strategy timeout in seconds.
    pub timeout: u64,
    /// User-Agent for direct requests.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: BROWSER_USER_AGENT.to_string() }
    }
}

impl FetchConfig {
    /// Header set sent on direct requests.
    pub fn browser_headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("DNT", "1"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
    }
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with [`GleanerError::HttpStatus`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() { Ok(self) } else { Err(GleanerError::HttpStatus { status: self.status }) }
    }
}

/// Performs GET requests for the retrieval pipeline.
///
/// Implementations return non-2xx responses as `Ok`; status checks belong
/// to the caller.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// `reqwest`-backed [`Transport`].
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: u64,
}

#[cfg(feature = "fetch")]
impl HttpTransport {
    /// Builds a client that follows redirects and gives up after the
    /// configured timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout)).build()?;
        Ok(Self { client, timeout: config.timeout })
    }
}

#[cfg(feature = "fetch")]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() { GleanerError::Timeout { timeout: self.timeout } } else { GleanerError::HttpError(e) }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(HttpResponse { status, content_type, body })
    }
}

/// Parses a URL and requires an http or https scheme.
pub fn validate_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim()).map_err(|e| GleanerError::InvalidUrl(format!("{input}: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(GleanerError::InvalidUrl(format!("{input}: missing host"))),
        scheme => Err(GleanerError::InvalidUrl(format!("{input}: unsupported scheme '{scheme}'"))),
    }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(GleanerError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(GleanerError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}
