use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::record::DocumentRecord;
use crate::{GleanerError, Result};

static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static TABLE_ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static LINE_PADDING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Configuration for Markdown conversion
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Include TOML frontmatter with title, source and extraction time
    pub include_frontmatter: bool,
    /// Generate reference table for all links
    pub include_references: bool,
    /// Strip images from output
    pub strip_images: bool,
    /// Include title as H1 heading at the start of content
    pub include_title_heading: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { include_frontmatter: true, include_references: false, strip_images: false, include_title_heading: true }
    }
}

/// A distinct link found in the content
#[derive(Debug, Clone)]
pub struct LinkReference {
    /// The link text
    pub text: String,
    /// The link URL
    pub url: String,
}

/// Convert a record to Markdown with optional frontmatter and references
pub fn convert_to_markdown(record: &DocumentRecord, config: &MarkdownConfig) -> Result<String> {
    let mut output = String::new();

    if config.include_frontmatter {
        output.push_str(&generate_frontmatter(record));
        output.push('\n');
    }

    if config.include_title_heading {
        output.push_str(&format!("# {}\n\n", record.title()));
    }

    let html = if config.strip_images { strip_images(record.content())? } else { record.content().to_string() };

    output.push_str(&html_to_markdown(&html));

    if config.include_references {
        let links = extract_links(&html);
        if !links.is_empty() {
            output.push_str("\n\n## References\n\n");
            output.push_str(&generate_reference_table(&links));
        }
    }

    Ok(output)
}

/// Generate TOML frontmatter from the record
fn generate_frontmatter(record: &DocumentRecord) -> String {
    let mut frontmatter = String::from("+++");

    frontmatter.push_str(&format!("\ntitle = {}", toml_escape_string(record.title())));
    frontmatter.push_str(&format!("\nsource = {}", toml_escape_string(record.source_url())));
    frontmatter.push_str(&format!("\nextracted = {}", toml_escape_string(&record.extracted_at_rfc3339())));

    if record.is_synthetic() {
        frontmatter.push_str("\nsynthetic = true");
    }

    frontmatter.push_str("\n+++\n");
    frontmatter
}

/// Escape quotes, backslashes and control characters for a TOML basic string
fn toml_escape_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
}

/// Convert an HTML fragment to Markdown.
///
/// Runs of three or more newlines collapse to a blank line and the result
/// is trimmed.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    visit_children(fragment.root_element(), &mut out);

    let out = LINE_PADDING.replace_all(&out, "\n");
    BLANK_RUNS.replace_all(&out, "\n\n").trim().to_string()
}

fn visit_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&WHITESPACE.replace_all(text, " ")),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    visit(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Markdown for an element's children on one logical line.
fn inline(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    visit_children(element, &mut out);
    out.trim().to_string()
}

fn visit(element: ElementRef<'_>, out: &mut String) {
    let el = element.value();
    if el.classes().any(|class| class == "external-indicator") {
        return;
    }

    match el.name() {
        "script" | "style" | "noscript" => {}
        name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
            let level = usize::from(name.as_bytes()[1] - b'0');
            out.push_str(&format!("\n\n{} {}\n\n", "#".repeat(level), inline(element)));
        }
        "strong" | "b" => wrap_inline(element, "**", out),
        "em" | "i" => wrap_inline(element, "*", out),
        "a" => match el.attr("href") {
            Some(href) => out.push_str(&format!("[{}]({href})", inline(element))),
            None => visit_children(element, out),
        },
        "p" => out.push_str(&format!("\n\n{}\n\n", inline(element))),
        "br" => out.push('\n'),
        "ul" | "ol" => {
            out.push('\n');
            visit_children(element, out);
            out.push('\n');
        }
        "li" => out.push_str(&format!("- {}\n", inline(element))),
        "code" => out.push_str(&format!("`{}`", element.text().collect::<String>())),
        "pre" => {
            let code = element.text().collect::<String>();
            out.push_str(&format!("\n\n```\n{}\n```\n\n", code.trim_matches('\n')));
        }
        "img" => {
            if let Some(src) = el.attr("src") {
                out.push_str(&format!("![{}]({src})", el.attr("alt").unwrap_or_default()));
            }
        }
        "blockquote" => {
            let mut inner = String::new();
            visit_children(element, &mut inner);
            let quoted = inner
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| format!("> {line}"))
                .collect::<Vec<_>>()
                .join("\n");
            out.push_str(&format!("\n\n{quoted}\n\n"));
        }
        "table" => visit_table(element, out),
        "hr" => out.push_str("\n\n---\n\n"),
        "div" | "section" | "article" | "figure" | "figcaption" | "header" | "footer" => {
            out.push_str("\n\n");
            visit_children(element, out);
            out.push_str("\n\n");
        }
        _ => visit_children(element, out),
    }
}

fn wrap_inline(element: ElementRef<'_>, marker: &str, out: &mut String) {
    let text = inline(element);
    if !text.is_empty() {
        out.push_str(&format!("{marker}{text}{marker}"));
    }
}

/// Pipe table with the first row as header.
fn visit_table(table: ElementRef<'_>, out: &mut String) {
    out.push_str("\n\n");

    for caption in table.children().filter_map(ElementRef::wrap).filter(|c| c.value().name() == "caption") {
        out.push_str(&format!("{}\n\n", inline(caption)));
    }

    let rows: Vec<Vec<String>> = table
        .select(&TABLE_ROWS)
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| escape_pipe(&inline(cell)))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
        if i == 0 {
            out.push_str(&format!("|{}\n", "---|".repeat(row.len())));
        }
    }

    out.push('\n');
}

/// Removes every `<img>` before conversion
fn strip_images(html: &str) -> Result<String> {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("img", |el| {
                el.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| GleanerError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| GleanerError::HtmlParseError(e.to_string()))?;

    String::from_utf8(output).map_err(|e| GleanerError::HtmlParseError(e.to_string()))
}

/// Extract all links from HTML content, first occurrence of each URL wins
pub fn extract_links(html: &str) -> Vec<LinkReference> {
    let fragment = Html::parse_fragment(html);
    let mut links = Vec::new();
    let mut seen_urls = HashMap::new();

    for element in fragment.select(&LINKS) {
        let text = inline(element);
        let Some(url) = element.value().attr("href") else {
            continue;
        };

        if text.is_empty() || url.is_empty() || seen_urls.contains_key(url) {
            continue;
        }

        seen_urls.insert(url.to_string(), links.len());
        links.push(LinkReference { text, url: url.to_string() });
    }

    links
}

/// Numbered `# / Text / URL` table
fn generate_reference_table(links: &[LinkReference]) -> String {
    let mut table = String::from("| # | Text | URL |\n");
    table.push_str("|---|------|-----|\n");

    for (i, link) in links.iter().enumerate() {
        table.push_str(&format!("| {} | {} | {} |\n", i + 1, escape_pipe(&link.text), escape_pipe(&link.url)));
    }

    table
}

fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Holds a [`MarkdownConfig`] for repeated conversions.
pub struct MarkdownFormatter {
    config: MarkdownConfig,
}

impl MarkdownFormatter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, record: &DocumentRecord) -> Result<String> {
        convert_to_markdown(record, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use url::Url;

    fn record(content: &str) -> DocumentRecord {
        let url = Url::parse("https://example.com/post").unwrap();
        DocumentRecord::new("Test Title", &url, content, Vec::new(), datetime!(2024-01-15 09:30:00 UTC))
    }

    fn body_only() -> MarkdownConfig {
        MarkdownConfig { include_frontmatter: false, include_title_heading: false, ..Default::default() }
    }

    #[test]
    fn test_html_to_markdown_basic() {
        let markdown = html_to_markdown("<h1>Title</h1><p>This is a paragraph.</p>");
        assert_eq!(markdown, "# Title\n\nThis is a paragraph.");
    }

    #[test]
    fn test_heading_levels() {
        let markdown = html_to_markdown("<h2>Two</h2><h4>Four</h4>");
        assert_eq!(markdown, "## Two\n\n#### Four");
    }

    #[test]
    fn test_inline_emphasis() {
        let markdown = html_to_markdown("<p>Some <strong>bold</strong>, <b>more</b> and <em>soft</em> <i>text</i>.</p>");
        assert_eq!(markdown, "Some **bold**, **more** and *soft* *text*.");
    }

    #[test]
    fn test_html_to_markdown_with_links() {
        let markdown = html_to_markdown(r#"<p>Check out <a href="https://example.com">this link</a>.</p>"#);
        assert_eq!(markdown, "Check out [this link](https://example.com).");
    }

    #[test]
    fn test_external_indicator_is_skipped() {
        let markdown = html_to_markdown(
            r#"<p><a href="https://x.org" class="external-link">Out <span class="external-indicator">🔗</span></a></p>"#,
        );
        assert_eq!(markdown, "[Out](https://x.org)");
    }

    #[test]
    fn test_lists_and_breaks() {
        let markdown = html_to_markdown("<p>Intro</p><ul><li>One</li><li>Two</li></ul><p>a<br>b</p>");
        assert_eq!(markdown, "Intro\n\n- One\n- Two\n\na\nb");
    }

    #[test]
    fn test_html_to_markdown_with_images() {
        let markdown = html_to_markdown(r#"<p>An image: <img src="photo.jpg" alt="A photo"></p>"#);
        assert!(markdown.contains("![A photo](photo.jpg)"));
    }

    #[test]
    fn test_html_to_markdown_with_code() {
        let markdown = html_to_markdown(r#"<p>Call <code>main()</code></p><pre><code>fn main() {}</code></pre>"#);
        assert!(markdown.contains("Call `main()`"));
        assert!(markdown.contains("```\nfn main() {}\n```"));
    }

    #[test]
    fn test_html_to_markdown_with_blockquotes() {
        let markdown = html_to_markdown("<blockquote><p>This is a quote</p></blockquote>");
        assert_eq!(markdown, "> This is a quote");
    }

    #[test]
    fn test_html_to_markdown_with_tables() {
        let html = r#"
            <table>
                <caption>Table 1</caption>
                <thead><tr><th>Column 1</th><th>Column 2</th></tr></thead>
                <tbody><tr><td>Data 1</td><td>Data|2</td></tr></tbody>
            </table>
        "#;

        let markdown = html_to_markdown(html);
        assert!(markdown.contains("Table 1"));
        assert!(markdown.contains("| Column 1 | Column 2 |\n|---|---|\n| Data 1 | Data\\|2 |"));
    }

    #[test]
    fn test_scripts_are_dropped() {
        let markdown = html_to_markdown("<p>Kept</p><script>var x = 1;</script><style>p{}</style>");
        assert_eq!(markdown, "Kept");
    }

    #[test]
    fn test_blank_runs_collapse() {
        let markdown = html_to_markdown("<p>One</p><p></p><p></p><p>Two</p>");
        assert_eq!(markdown, "One\n\nTwo");
    }

    #[test]
    fn test_convert_prepends_frontmatter_and_heading() {
        let markdown = convert_to_markdown(&record("<p>Body text.</p>"), &MarkdownConfig::default()).unwrap();
        let expected = "+++\ntitle = \"Test Title\"\nsource = \"https://example.com/post\"\nextracted = \
                        \"2024-01-15T09:30:00Z\"\n+++\n\n# Test Title\n\nBody text.";
        assert_eq!(markdown, expected);
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let record = record("<h2>Part</h2><p>Body <em>text</em>.</p><ul><li>x</li></ul>");
        let first = convert_to_markdown(&record, &MarkdownConfig::default()).unwrap();
        let second = convert_to_markdown(&record, &MarkdownConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_synthetic_flag_in_frontmatter() {
        let url = Url::parse("https://example.com/").unwrap();
        let record = crate::synthesize::synthesize_at(&url, None, datetime!(2024-01-15 09:30:00 UTC));
        let markdown = convert_to_markdown(&record, &MarkdownConfig::default()).unwrap();
        assert!(markdown.contains("synthetic = true"));
    }

    #[test]
    fn test_strip_images() {
        let config = MarkdownConfig { strip_images: true, ..body_only() };
        let markdown = convert_to_markdown(&record(r#"<p>Text before <img src="photo.jpg"> text after.</p>"#), &config);
        let markdown = markdown.unwrap();
        assert!(!markdown.contains("photo.jpg"));
        assert!(markdown.contains("Text before"));
    }

    #[test]
    fn test_extract_links() {
        let html = r#"
            <p>
                <a href="https://example.com">Example</a>
                <a href="/relative">Relative</a>
                <a href="https://example.com">Second</a>
            </p>
        "#;

        let links = extract_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Example");
        assert_eq!(links[1].url, "/relative");
    }

    #[test]
    fn test_convert_with_references() {
        let config = MarkdownConfig { include_references: true, ..body_only() };
        let html = r#"<p>Visit <a href="https://example.com">Example</a> for more info.</p>"#;
        let markdown = convert_to_markdown(&record(html), &config).unwrap();
        assert!(markdown.contains("## References"));
        assert!(markdown.contains("| 1 | Example | https://example.com |"));
    }

    #[test]
    fn test_toml_escape() {
        assert_eq!(toml_escape_string("My \"Title\" here"), r#""My \"Title\" here""#);
        assert_eq!(toml_escape_string("Line 1\nLine 2"), r#""Line 1\nLine 2""#);
    }

    #[test]
    fn test_escape_pipe() {
        assert_eq!(escape_pipe("a|b|c"), r"a\|b\|c");
        assert_eq!(escape_pipe("no pipes"), "no pipes");
    }

    #[test]
    fn test_markdown_formatter() {
        let record = record("<h1>Test</h1><p>Content</p>");
        let config = body_only();
        let formatter = MarkdownFormatter::new(config.clone());
        assert_eq!(formatter.convert(&record).unwrap(), convert_to_markdown(&record, &config).unwrap());
    }
}
