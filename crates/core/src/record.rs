//! Document record type with content, images, and format conversion.
//!
//! This module defines [`DocumentRecord`], the single artifact produced by
//! every extraction path: a real page run through the locator and
//! normalizer, a text relay payload run through the text-mode parser, or
//! synthesized placeholder content.

use std::fmt;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::Result;
use crate::formatters::json::{JsonConfig, to_json_value};
use crate::formatters::markdown::{MarkdownConfig, convert_to_markdown};
use crate::formatters::text::{TextStats, html_to_text, stats};
use crate::formatters::{OutputFormat, render};

/// Title used when a document has no usable title.
pub const NO_TITLE: &str = "No title found";

/// Width or height of an extracted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    /// Declared pixel size
    Pixels(u32),
    /// No usable size was declared
    #[default]
    Auto,
}

impl Dimension {
    /// Reads a `width`/`height` attribute value.
    ///
    /// Anything that is not a positive integer pixel count (`"50%"`, `"0"`,
    /// `"auto"`, a missing attribute) becomes [`Dimension::Auto`].
    pub fn from_attr(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .map(|v| v.strip_suffix("px").unwrap_or(v))
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|px| *px > 0)
            .map_or(Dimension::Auto, Dimension::Pixels)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pixels(px) => write!(f, "{px}"),
            Dimension::Auto => f.write_str("auto"),
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Dimension::Pixels(px) => serializer.serialize_u32(*px),
            Dimension::Auto => serializer.serialize_str("auto"),
        }
    }
}

/// An image found in the content region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Absolute image URL
    pub src: String,
    /// Alternative text, empty when absent
    pub alt: String,
    pub width: Dimension,
    pub height: Dimension,
}

/// The canonical result of an extraction.
///
/// Fields are read through accessors; a record is replaced wholesale rather
/// than edited. Every record handed out by the retrieval pipeline has
/// non-blank content.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    title: String,
    source_url: String,
    content: String,
    images: Vec<ImageInfo>,
    #[serde(with = "time::serde::rfc3339")]
    extracted_at: OffsetDateTime,
    synthetic: bool,
}

impl DocumentRecord {
    /// Creates a record from its parts.
    ///
    /// A blank title is replaced with [`NO_TITLE`].
    pub fn new(
        title: impl Into<String>, source_url: &Url, content: impl Into<String>, images: Vec<ImageInfo>,
        extracted_at: OffsetDateTime,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() { NO_TITLE.to_string() } else { title.trim().to_string() };

        Self {
            title,
            source_url: source_url.to_string(),
            content: content.into(),
            images,
            extracted_at,
            synthetic: false,
        }
    }

    pub(crate) fn into_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The URL the caller asked for, not the relay that served it.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// The normalized content fragment.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    pub fn extracted_at(&self) -> OffsetDateTime {
        self.extracted_at
    }

    /// The extraction time as an RFC 3339 string.
    pub fn extracted_at_rfc3339(&self) -> String {
        self.extracted_at.format(&Rfc3339).unwrap_or_else(|_| self.extracted_at.to_string())
    }

    /// Whether the content is placeholder content rather than the page's own.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Whether the content has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// The content with all markup stripped.
    pub fn text(&self) -> String {
        html_to_text(&self.content)
    }

    /// Word, character and reading-time statistics for the content.
    pub fn stats(&self) -> TextStats {
        stats(&self.text())
    }

    /// Converts the record to the specified format.
    pub fn to_format(&self, format: OutputFormat) -> Result<String> {
        render(self, format)
    }

    /// Gets content as Markdown with frontmatter and a title heading.
    pub fn to_markdown(&self) -> Result<String> {
        convert_to_markdown(self, &MarkdownConfig::default())
    }

    /// Gets content as Markdown with custom configuration.
    pub fn to_markdown_with_config(&self, config: &MarkdownConfig) -> Result<String> {
        convert_to_markdown(self, config)
    }

    /// Gets the record as a JSON value, stats included.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        to_json_value(self, &JsonConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_url() -> Url {
        Url::parse("https://example.com/post").unwrap()
    }

    fn sample_record() -> DocumentRecord {
        DocumentRecord::new(
            "  A Title  ",
            &sample_url(),
            "<p class=\"extracted-paragraph\">Some words here.</p>",
            vec![ImageInfo {
                src: "https://example.com/a.png".to_string(),
                alt: "An image".to_string(),
                width: Dimension::Pixels(640),
                height: Dimension::Auto,
            }],
            datetime!(2024-03-01 12:00:00 UTC),
        )
    }

    #[test]
    fn test_record_creation() {
        let record = sample_record();
        assert_eq!(record.title(), "A Title");
        assert_eq!(record.source_url(), "https://example.com/post");
        assert_eq!(record.images().len(), 1);
        assert!(!record.is_synthetic());
        assert!(!record.is_blank());
        assert_eq!(record.text(), "Some words here.");
    }

    #[test]
    fn test_blank_title_uses_sentinel() {
        let record = DocumentRecord::new("   ", &sample_url(), "<p>x</p>", Vec::new(), OffsetDateTime::now_utc());
        assert_eq!(record.title(), NO_TITLE);
    }

    #[test]
    fn test_blank_content_detection() {
        let record = DocumentRecord::new("T", &sample_url(), "<div> <span></span> </div>", Vec::new(), OffsetDateTime::now_utc());
        assert!(record.is_blank());
    }

    #[test]
    fn test_dimension_from_attr() {
        assert_eq!(Dimension::from_attr(Some("640")), Dimension::Pixels(640));
        assert_eq!(Dimension::from_attr(Some(" 32px ")), Dimension::Pixels(32));
        assert_eq!(Dimension::from_attr(Some("50%")), Dimension::Auto);
        assert_eq!(Dimension::from_attr(Some("0")), Dimension::Auto);
        assert_eq!(Dimension::from_attr(None), Dimension::Auto);
    }

    #[test]
    fn test_record_serializes_with_rfc3339_and_auto() {
        let value = sample_record().to_json().unwrap();
        assert_eq!(value["title"], "A Title");
        assert_eq!(value["extracted_at"], "2024-03-01T12:00:00Z");
        assert_eq!(value["images"][0]["width"], 640);
        assert_eq!(value["images"][0]["height"], "auto");
        assert_eq!(value["synthetic"], false);
        assert_eq!(value["stats"]["word_count"], 3);
    }

    #[test]
    fn test_extracted_at_rfc3339() {
        assert_eq!(sample_record().extracted_at_rfc3339(), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_into_synthetic() {
        let record = sample_record().into_synthetic();
        assert!(record.is_synthetic());
    }
}
