//! Main retrieval API.
//!
//! [`Retriever`] turns a URL into a [`DocumentRecord`] by trying a fixed
//! sequence of strategies until one produces an acceptable payload:
//!
//! 1. a direct request with browser-like headers,
//! 2. each markup relay from [`default_relays`], in order,
//! 3. the text relay from [`default_text_relay`].
//!
//! Strategies run one at a time, each at most once, each bounded by the
//! configured timeout. If all of them fail the record is synthesized from
//! the URL and the last error, so retrieval itself never fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use gleaner_core::{GleanerConfig, Retriever, validate_url};
//!
//! # async fn example() -> gleaner_core::Result<()> {
//! let url = validate_url("https://example.com/blog/post")?;
//! let retriever = Retriever::new(GleanerConfig::builder().timeout(10).build())?;
//! let record = retriever.retrieve(&url).await;
//! println!("{}", record.title());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use time::OffsetDateTime;
use url::Url;

#[cfg(feature = "fetch")]
use crate::fetch::HttpTransport;
use crate::fetch::{FetchConfig, Transport};
use crate::locate::{LocatorConfig, locate};
use crate::normalize::{NormalizeOptions, normalize};
use crate::parse::Document;
use crate::record::DocumentRecord;
use crate::relay::{PayloadKind, Relay, default_relays, default_text_relay};
use crate::synthesize::synthesize;
use crate::text_mode::parse_text;
use crate::{GleanerError, Result};

/// Markers that identify a relay payload as markup.
const MARKUP_MARKERS: &[&str] = &["<html", "<body", "<title>"];
/// Unmarked relay payloads longer than this are accepted anyway.
const PROVISIONAL_PAYLOAD_CHARS: usize = 500;
/// Text relay payloads must be longer than this once trimmed.
const MIN_TEXT_PAYLOAD_CHARS: usize = 100;

/// Configuration for retrieval and extraction.
///
/// # Example
///
/// ```rust
/// use gleaner_core::GleanerConfig;
///
/// let config = GleanerConfig::builder()
///     .timeout(15)
///     .include_images(false)
///     .build();
/// assert_eq!(config.fetch.timeout, 15);
/// ```
#[derive(Debug, Clone)]
pub struct GleanerConfig {
    /// Timeout and direct-request user agent.
    pub fetch: FetchConfig,

    /// Whether records list the images of the content region (default: true).
    pub include_images: bool,

    /// Content locator thresholds.
    pub locator: LocatorConfig,
}

impl Default for GleanerConfig {
    fn default() -> Self {
        Self { fetch: FetchConfig::default(), include_images: true, locator: LocatorConfig::default() }
    }
}

impl GleanerConfig {
    /// Creates a new builder for GleanerConfig.
    pub fn builder() -> GleanerConfigBuilder {
        GleanerConfigBuilder::new()
    }
}

/// Builder for GleanerConfig.
pub struct GleanerConfigBuilder {
    config: GleanerConfig,
}

impl GleanerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: GleanerConfig::default() }
    }

    /// Sets the per-strategy timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    /// Sets the User-Agent for direct requests.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets whether records list images.
    pub fn include_images(mut self, value: bool) -> Self {
        self.config.include_images = value;
        self
    }

    /// Replaces the locator thresholds.
    pub fn locator(mut self, value: LocatorConfig) -> Self {
        self.config.locator = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> GleanerConfig {
        self.config
    }
}

impl Default for GleanerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// How a single strategy ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// One strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalAttempt {
    /// `direct` or the relay id
    pub strategy_id: &'static str,
    /// Position in the strategy sequence, starting at 1
    pub ordinal: usize,
    pub outcome: AttemptOutcome,
    /// Error message for failed attempts
    pub error: Option<String>,
}

impl fmt::Display for RetrievalAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.outcome, &self.error) {
            (AttemptOutcome::Success, _) => write!(f, "{}. {}: ok", self.ordinal, self.strategy_id),
            (AttemptOutcome::Failure, Some(error)) => write!(f, "{}. {}: {}", self.ordinal, self.strategy_id, error),
            (AttemptOutcome::Failure, None) => write!(f, "{}. {}: failed", self.ordinal, self.strategy_id),
        }
    }
}

enum Strategy<'r> {
    Direct,
    Relay(&'r dyn Relay),
}

impl Strategy<'_> {
    fn id(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Relay(relay) => relay.id(),
        }
    }
}

/// Build a record from markup the caller already holds.
///
/// Locates the main content region, normalizes it, and takes the title from
/// the document's `<title>`.
pub fn extract_html(html: &str, source_url: &Url, config: &GleanerConfig) -> DocumentRecord {
    let doc = Document::parse(html);
    let title = doc.title().unwrap_or_default();

    let region = locate(&doc, &config.locator);
    let options = NormalizeOptions { base_url: source_url, include_images: config.include_images };
    let fragment = normalize(&region.element, &options);

    DocumentRecord::new(title, source_url, fragment.html, fragment.images, OffsetDateTime::now_utc())
}

/// Accept relay markup that looks like a page, or is at least substantial.
fn validate_markup(payload: &str) -> Result<()> {
    if MARKUP_MARKERS.iter().any(|marker| payload.contains(marker)) {
        return Ok(());
    }

    let len = payload.chars().count();
    if len > PROVISIONAL_PAYLOAD_CHARS {
        tracing::debug!(len, "accepting unmarked relay payload provisionally");
        Ok(())
    } else {
        Err(GleanerError::Rejected(format!("payload of {len} characters does not look like markup")))
    }
}

fn validate_text(payload: &str) -> Result<()> {
    let len = payload.trim().chars().count();
    if len > MIN_TEXT_PAYLOAD_CHARS {
        Ok(())
    } else {
        Err(GleanerError::Rejected(format!("text payload of {len} characters is too short")))
    }
}

/// Retrieval pipeline over a [`Transport`].
pub struct Retriever<T> {
    transport: T,
    relays: Vec<Box<dyn Relay>>,
    text_relay: Box<dyn Relay>,
    config: GleanerConfig,
}

#[cfg(feature = "fetch")]
impl Retriever<HttpTransport> {
    /// Creates a retriever backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::HttpError`] if the HTTP client cannot be built.
    pub fn new(config: GleanerConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.fetch)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> Retriever<T> {
    /// Creates a retriever over any transport with the default relays.
    pub fn with_transport(transport: T, config: GleanerConfig) -> Self {
        Self { transport, relays: default_relays(), text_relay: default_text_relay(), config }
    }

    /// Replaces the markup relays.
    pub fn with_relays(mut self, relays: Vec<Box<dyn Relay>>) -> Self {
        self.relays = relays;
        self
    }

    /// Replaces the text relay.
    pub fn with_text_relay(mut self, relay: Box<dyn Relay>) -> Self {
        self.text_relay = relay;
        self
    }

    pub fn config(&self) -> &GleanerConfig {
        &self.config
    }

    /// Retrieve a URL. Never fails; see the module docs.
    pub async fn retrieve(&self, url: &Url) -> DocumentRecord {
        self.retrieve_with_attempts(url).await.0
    }

    /// Retrieve a URL and report every strategy that was tried.
    pub async fn retrieve_with_attempts(&self, url: &Url) -> (DocumentRecord, Vec<RetrievalAttempt>) {
        let strategies = std::iter::once(Strategy::Direct)
            .chain(self.relays.iter().map(|relay| Strategy::Relay(relay.as_ref())))
            .chain(std::iter::once(Strategy::Relay(self.text_relay.as_ref())));

        let mut attempts = Vec::new();
        let mut last_error = None;

        for (index, strategy) in strategies.enumerate() {
            let ordinal = index + 1;
            let strategy_id = strategy.id();
            tracing::debug!(strategy = strategy_id, ordinal, %url, "trying retrieval strategy");

            match self.bounded(self.run(&strategy, url)).await {
                Ok(record) => {
                    tracing::info!(strategy = strategy_id, ordinal, title = record.title(), "retrieved document");
                    attempts.push(RetrievalAttempt { strategy_id, ordinal, outcome: AttemptOutcome::Success, error: None });
                    return (self.ensure_content(record, url), attempts);
                }
                Err(error) => {
                    tracing::debug!(strategy = strategy_id, ordinal, %error, "retrieval strategy failed");
                    attempts.push(RetrievalAttempt {
                        strategy_id,
                        ordinal,
                        outcome: AttemptOutcome::Failure,
                        error: Some(error.to_string()),
                    });
                    last_error = Some(error);
                }
            }
        }

        tracing::warn!(%url, attempts = attempts.len(), "all retrieval strategies failed, synthesizing content");
        (synthesize(url, last_error.as_ref()), attempts)
    }

    /// Bound a strategy by the configured timeout.
    async fn bounded(&self, strategy: impl Future<Output = Result<DocumentRecord>>) -> Result<DocumentRecord> {
        let timeout = self.config.fetch.timeout;
        tokio::time::timeout(Duration::from_secs(timeout), strategy)
            .await
            .unwrap_or_else(|_| Err(GleanerError::Timeout { timeout }))
    }

    async fn run(&self, strategy: &Strategy<'_>, url: &Url) -> Result<DocumentRecord> {
        match strategy {
            Strategy::Direct => self.direct(url).await,
            Strategy::Relay(relay) => self.relay(*relay, url).await,
        }
    }

    async fn direct(&self, url: &Url) -> Result<DocumentRecord> {
        let headers = self.config.fetch.browser_headers();
        let response = self.transport.get(url.as_str(), &headers).await?.error_for_status()?;

        if response.body.trim().is_empty() {
            return Err(GleanerError::EmptyBody);
        }

        Ok(extract_html(&response.body, url, &self.config))
    }

    async fn relay(&self, relay: &dyn Relay, url: &Url) -> Result<DocumentRecord> {
        let endpoint = relay.endpoint(url);
        let headers = [("Accept", relay.accept()), ("User-Agent", relay.user_agent())];
        let response = self.transport.get(&endpoint, &headers).await?.error_for_status()?;
        let payload = relay.unwrap(&response)?;

        match relay.kind() {
            PayloadKind::Markup => {
                validate_markup(&payload)?;
                Ok(extract_html(&payload, url, &self.config))
            }
            PayloadKind::Text => {
                validate_text(&payload)?;
                Ok(parse_text(&payload, url))
            }
        }
    }

    /// Replace a record whose content came out blank.
    fn ensure_content(&self, record: DocumentRecord, url: &Url) -> DocumentRecord {
        if record.is_blank() {
            tracing::debug!(%url, "extracted content was blank, synthesizing content");
            synthesize(url, None)
        } else {
            record
        }
    }
}

/// Retrieve a URL with the default configuration.
///
/// A client that cannot be built is treated like a total retrieval failure.
#[cfg(feature = "fetch")]
pub async fn retrieve(url: &Url) -> DocumentRecord {
    match Retriever::new(GleanerConfig::default()) {
        Ok(retriever) => retriever.retrieve(url).await,
        Err(error) => {
            tracing::warn!(%error, "could not build HTTP client, synthesizing content");
            synthesize(url, Some(&error))
        }
    }
}
