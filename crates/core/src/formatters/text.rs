use scraper::node::Node;
use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::Result;
use crate::record::DocumentRecord;

const BLOCK_ELEMENTS: [&str; 27] = [
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "ul",
    "ol",
    "blockquote",
    "pre",
    "table",
    "caption",
    "tr",
    "td",
    "th",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "aside",
    "figure",
    "figcaption",
    "hr",
];

/// Average reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Plain-text rendering options
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Preserve paragraph structure with double newlines
    pub preserve_paragraphs: bool,

    /// Wrap lines at specified width (0 = no wrapping)
    pub line_width: usize,

    /// Include title and source header
    pub include_header: bool,
}

/// Word, character and reading-time counts for a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
    pub reading_time_minutes: usize,
}

/// Count words and characters and estimate reading time.
///
/// Words are whitespace-separated runs; reading time rounds up, so any
/// non-empty text takes at least a minute.
pub fn stats(text: &str) -> TextStats {
    let word_count = text.split_whitespace().count();
    TextStats {
        word_count,
        char_count: text.chars().count(),
        reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
    }
}

/// Plain text formatter for converting records to readable plain text
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Convert a record's content to plain text
    pub fn convert(&self, record: &DocumentRecord) -> Result<String> {
        convert_to_text(record, &self.config)
    }
}

/// Convert a record's content to plain text with specified configuration
pub fn convert_to_text(record: &DocumentRecord, config: &TextConfig) -> Result<String> {
    let mut output = String::new();

    if config.include_header {
        output.push_str(&generate_header(record));
        output.push_str("\n\n");
    }

    let text = if config.preserve_paragraphs {
        extract_text_with_paragraphs(record.content())
    } else {
        html_to_text(record.content())
    };

    let final_text = if config.line_width > 0 { wrap_text(&text, config.line_width) } else { text };

    output.push_str(&final_text);

    Ok(output.trim().to_string())
}

/// Generate a header from the record
fn generate_header(record: &DocumentRecord) -> String {
    let title = record.title();
    let mut header = String::new();

    header.push_str(title);
    header.push('\n');
    header.push_str(&"=".repeat(title.chars().count()));
    header.push('\n');
    header.push_str(&format!("Source: {} | Extracted: {}", record.source_url(), record.extracted_at_rfc3339()));
    header.push('\n');

    header
}

/// Strip markup from an HTML fragment, one line per block.
pub fn html_to_text(html: &str) -> String {
    block_lines(html).join("\n")
}

/// Strip markup from an HTML fragment, separating blocks with blank lines.
fn extract_text_with_paragraphs(html: &str) -> String {
    block_lines(html).join("\n\n")
}

/// Visible text of each block, whitespace collapsed, empty blocks dropped.
fn block_lines(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::new();
    collect_text(fragment.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if matches!(name, "script" | "style") || el.classes().any(|class| class == "external-indicator") {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Wrap each line independently
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    text.split("\n\n")
        .map(|paragraph| {
            paragraph
                .lines()
                .map(|line| {
                    let words: Vec<&str> = line.split_whitespace().collect();
                    if words.is_empty() { String::new() } else { wrap_words(&words, width) }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Greedy fill of words into lines no wider than `width`
pub(crate) fn wrap_words(words: &[&str], width: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line = Vec::new();
    let mut current_length = 0;

    for &word in words {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;
    use url::Url;

    fn record(content: &str) -> DocumentRecord {
        let url = Url::parse("https://example.com/article").unwrap();
        DocumentRecord::new("Test Article", &url, content, Vec::new(), datetime!(2024-01-15 10:00:00 UTC))
    }

    #[rstest]
    #[case("", 0, 0)]
    #[case("hello", 1, 1)]
    #[case("   \n\t  ", 0, 0)]
    fn test_stats_small_inputs(#[case] text: &str, #[case] words: usize, #[case] minutes: usize) {
        let stats = stats(text);
        assert_eq!(stats.word_count, words);
        assert_eq!(stats.reading_time_minutes, minutes);
    }

    #[test]
    fn test_stats_reading_time_rounds_up() {
        let text = "word ".repeat(400);
        let stats = stats(&text);
        assert_eq!(stats.word_count, 400);
        assert_eq!(stats.char_count, 2000);
        assert_eq!(stats.reading_time_minutes, 2);

        assert_eq!(super::stats(&"word ".repeat(201)).reading_time_minutes, 2);
    }

    #[test]
    fn test_html_to_text_strips_tags() {
        let text = html_to_text(r#"<p>Text with <strong>bold</strong> and <em>italic</em>.</p>"#);
        assert_eq!(text, "Text with bold and italic.");
    }

    #[test]
    fn test_html_to_text_separates_blocks() {
        let text = html_to_text("<h1>Title</h1><p>This is a paragraph.</p><ul><li>One</li><li>Two</li></ul>");
        assert_eq!(text, "Title\nThis is a paragraph.\nOne\nTwo");
    }

    #[test]
    fn test_html_to_text_drops_link_indicator() {
        let text = html_to_text(
            r#"<p><a href="https://x.org">Link <span class="external-indicator">🔗</span></a></p>"#,
        );
        assert_eq!(text, "Link");
    }

    #[test]
    fn test_extract_text_with_paragraphs() {
        let text = extract_text_with_paragraphs("<p>First paragraph.</p><p>Second paragraph.</p>");
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_convert_to_text_with_header() {
        let config = TextConfig { include_header: true, ..Default::default() };
        let text = convert_to_text(&record("<p>Content here.</p>"), &config).unwrap();
        assert!(text.starts_with("Test Article\n============"));
        assert!(text.contains("Source: https://example.com/article"));
        assert!(text.contains("Extracted: 2024-01-15T10:00:00Z"));
        assert!(text.ends_with("Content here."));
    }

    #[test]
    fn test_convert_to_text_basic() {
        let text = convert_to_text(&record("<p>Simple paragraph with some text.</p>"), &TextConfig::default());
        assert_eq!(text.unwrap(), "Simple paragraph with some text.");
    }

    #[test]
    fn test_wrap_words() {
        let words = vec!["hello", "world", "this", "is", "a", "test"];
        assert_eq!(wrap_words(&words, 10), "hello\nworld this\nis a test");
    }

    #[test]
    fn test_wrap_text_with_zero_width() {
        let text = "This is a line";
        assert_eq!(wrap_text(text, 0), text);
    }

    #[test]
    fn test_wrap_text_keeps_paragraphs() {
        let wrapped = wrap_text("one two three\n\nfour five six", 8);
        assert_eq!(wrapped, "one two\nthree\n\nfour\nfive six");
    }

    #[test]
    fn test_text_formatter() {
        let config = TextConfig { preserve_paragraphs: true, ..Default::default() };
        let record = record("<p>Test content for formatter.</p>");
        let formatter = TextFormatter::new(config.clone());
        assert_eq!(formatter.convert(&record).unwrap(), convert_to_text(&record, &config).unwrap());
    }
}
