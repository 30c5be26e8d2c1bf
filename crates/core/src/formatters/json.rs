use serde::Serialize;

use crate::Result;
use crate::formatters::markdown::{self, LinkReference, MarkdownConfig};
use crate::formatters::text::TextStats;
use crate::record::DocumentRecord;

/// Serialized shape of a record: its fields, reading stats and optional extras.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Record fields, inlined at the top level
    #[serde(flatten)]
    pub record: &'a DocumentRecord,
    pub stats: TextStats,
    #[serde(skip_serializing_if = "ContentFormats::is_empty")]
    pub formats: ContentFormats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<JsonReference>>,
}

/// Alternate renderings carried alongside the HTML content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentFormats {
    /// Body only, no frontmatter or title heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentFormats {
    fn is_empty(&self) -> bool {
        self.markdown.is_none() && self.text.is_none()
    }
}

/// One distinct link of the content, numbered from 1 in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonReference {
    pub index: usize,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    pub include_markdown: bool,
    pub include_text: bool,
    pub include_references: bool,
    /// Indented output instead of a single line
    pub pretty: bool,
}

fn number_links(links: Vec<LinkReference>) -> Vec<JsonReference> {
    links
        .into_iter()
        .zip(1..)
        .map(|(LinkReference { text, url }, index)| JsonReference { index, text, url })
        .collect()
}

fn build_output<'a>(record: &'a DocumentRecord, config: &JsonConfig) -> Result<JsonOutput<'a>> {
    let markdown_config = MarkdownConfig { include_frontmatter: false, include_title_heading: false, ..Default::default() };

    let formats = ContentFormats {
        markdown: if config.include_markdown {
            Some(markdown::convert_to_markdown(record, &markdown_config)?)
        } else {
            None
        },
        text: if config.include_text { Some(record.text()) } else { None },
    };

    let references = if config.include_references {
        Some(number_links(markdown::extract_links(record.content())))
    } else {
        None
    };

    Ok(JsonOutput { record, stats: record.stats(), formats, references })
}

/// The record as a JSON value with its stats and any configured extras
pub fn to_json_value(record: &DocumentRecord, config: &JsonConfig) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(build_output(record, config)?)?)
}

pub fn convert_to_json(record: &DocumentRecord, config: &JsonConfig) -> Result<String> {
    let output = build_output(record, config)?;

    if config.pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}

/// Holds a [`JsonConfig`] for repeated conversions.
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, record: &DocumentRecord) -> Result<String> {
        convert_to_json(record, &self.config)
    }
}
