//! Converters from a [`DocumentRecord`] to output formats.
//!
//! Every converter takes the record by reference and leaves it untouched.
//! [`render`] picks the default configuration for each format; the
//! per-format modules expose their configuration for finer control.

pub mod json;
pub mod markdown;
pub mod paged;
pub mod text;
pub mod word;

use std::fmt;
use std::str::FromStr;

pub use json::{JsonConfig, JsonFormatter, convert_to_json};
pub use markdown::{MarkdownConfig, MarkdownFormatter, convert_to_markdown};
pub use paged::{PageStyle, PagedConfig, PagedDocument, convert_to_pages, layout};
pub use text::{TextConfig, TextFormatter, TextStats, convert_to_text, stats};
pub use word::convert_to_word;

use crate::record::DocumentRecord;
use crate::{GleanerError, Result};

/// Output format for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    /// JSON layout of A4 pages
    PaginatedDocument,
    PlainText,
    /// The normalized HTML fragment
    StyledFragment,
    /// Office-namespaced HTML document
    WordDocument,
    Json,
}

impl OutputFormat {
    /// Conventional file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::PaginatedDocument | OutputFormat::Json => "json",
            OutputFormat::PlainText => "txt",
            OutputFormat::StyledFragment => "html",
            OutputFormat::WordDocument => "doc",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::PaginatedDocument => "pages",
            OutputFormat::PlainText => "text",
            OutputFormat::StyledFragment => "html",
            OutputFormat::WordDocument => "word",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = GleanerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "pages" | "pdf" => Ok(OutputFormat::PaginatedDocument),
            "text" | "txt" => Ok(OutputFormat::PlainText),
            "html" => Ok(OutputFormat::StyledFragment),
            "word" | "doc" => Ok(OutputFormat::WordDocument),
            "json" => Ok(OutputFormat::Json),
            _ => Err(GleanerError::UnknownFormat(s.to_string())),
        }
    }
}

/// Render a record in the given format with default settings.
pub fn render(record: &DocumentRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => convert_to_markdown(record, &MarkdownConfig::default()),
        OutputFormat::PaginatedDocument => convert_to_pages(record, &PagedConfig::default()),
        OutputFormat::PlainText => {
            convert_to_text(record, &TextConfig { preserve_paragraphs: true, ..Default::default() })
        }
        OutputFormat::StyledFragment => Ok(record.content().to_string()),
        OutputFormat::WordDocument => convert_to_word(record),
        OutputFormat::Json => convert_to_json(record, &JsonConfig { include_text: true, pretty: true, ..Default::default() }),
    }
}
