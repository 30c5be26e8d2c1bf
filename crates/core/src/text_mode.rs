//! Minimal structure recovery from plain-text payloads.
//!
//! Text relays return a page's rendered text rather than its markup. This
//! module rebuilds a title, `<h2>` headings and `<p>` paragraphs from it.

use std::sync::LazyLock;

use regex::Regex;
use time::OffsetDateTime;
use url::Url;

use crate::record::{DocumentRecord, NO_TITLE};

/// A capitalized line with no sentence punctuation.
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][^.!?]*$").expect("valid regex"));

/// Only this many leading non-blank lines are considered for the title.
const TITLE_SCAN_LINES: usize = 5;
/// Only lines among this many leading non-blank lines can become headings.
const HEADING_SCAN_LINES: usize = 10;
const MAX_HEADING_CHARS: usize = 100;

/// Pick a title from the first few non-blank lines.
///
/// A title is 11 to 99 characters long and contains no `http`.
pub fn extract_title(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SCAN_LINES)
        .find(|line| {
            let len = line.chars().count();
            len > 10 && len < 100 && !line.contains("http")
        })
}

fn is_heading(line: &str, non_blank_index: usize) -> bool {
    non_blank_index < HEADING_SCAN_LINES && line.chars().count() < MAX_HEADING_CHARS && HEADING_LINE.is_match(line)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Convert plain text to headings and paragraphs.
///
/// Blank lines close the open paragraph; consecutive non-heading lines are
/// joined with single spaces.
pub fn text_to_html(text: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut non_blank_index = 0;

    let flush = |paragraph: &mut Vec<&str>, html: &mut String| {
        if !paragraph.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", escape(&paragraph.join(" "))));
            paragraph.clear();
        }
    };

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            flush(&mut paragraph, &mut html);
            continue;
        }

        if is_heading(line, non_blank_index) {
            flush(&mut paragraph, &mut html);
            html.push_str(&format!("<h2>{}</h2>\n", escape(line)));
        } else {
            paragraph.push(line);
        }
        non_blank_index += 1;
    }
    flush(&mut paragraph, &mut html);

    html.trim_end().to_string()
}

/// Build a record from a plain-text payload.
pub fn parse_text(text: &str, source_url: &Url) -> DocumentRecord {
    let title = extract_title(text).unwrap_or(NO_TITLE);
    DocumentRecord::new(title, source_url, text_to_html(text), Vec::new(), OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Title: short\n\
        Understanding Rust Lifetimes\n\
        \n\
        Lifetimes describe how long references are valid.\n\
        They are checked at compile time.\n\
        \n\
        Why It Matters\n\
        Borrowing rules prevent dangling pointers.";

    #[test]
    fn test_extract_title_skips_short_lines() {
        assert_eq!(extract_title(SAMPLE), Some("Title: short"));
        assert_eq!(extract_title("short\nThis is a good title"), Some("This is a good title"));
    }

    #[test]
    fn test_extract_title_skips_urls() {
        let text = "https://example.com/some/path\nA Reasonable Page Title";
        assert_eq!(extract_title(text), Some("A Reasonable Page Title"));
    }

    #[test]
    fn test_extract_title_only_scans_first_lines() {
        let text = "a\nb\nc\nd\ne\nThis line comes too late";
        assert_eq!(extract_title(text), None);
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let html = text_to_html(SAMPLE);
        assert!(html.contains("<h2>Understanding Rust Lifetimes</h2>"));
        assert!(html.contains(
            "<p>Lifetimes describe how long references are valid. They are checked at compile time.</p>"
        ));
        assert!(html.contains("<h2>Why It Matters</h2>"));
        assert!(html.contains("<p>Borrowing rules prevent dangling pointers.</p>"));
    }

    #[test]
    fn test_headings_limited_to_leading_lines() {
        let mut text = String::new();
        for i in 0..12 {
            text.push_str(&format!("line number {i}.\n"));
        }
        text.push_str("Late Capitalized Line\n");
        let html = text_to_html(&text);
        assert!(!html.contains("<h2>"));
        assert!(html.contains("Late Capitalized Line"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = text_to_html("if a < b && c > d then go.");
        assert_eq!(html, "<p>if a &lt; b &amp;&amp; c &gt; d then go.</p>");
    }

    #[test]
    fn test_parse_text_record() {
        let url = Url::parse("https://example.com/a").unwrap();
        let record = parse_text("tiny\nx", &url);
        assert_eq!(record.title(), NO_TITLE);
        assert!(record.images().is_empty());
        assert!(!record.is_synthetic());
        assert_eq!(record.content(), "<p>tiny x</p>");
    }
}
