//! Placeholder content for pages that could not be retrieved.
//!
//! When every retrieval strategy fails the pipeline still returns a record.
//! Its content comes from one of four fixed templates chosen by URL path,
//! states plainly that it is simulated, and quotes the last retrieval error
//! when there was one.

use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

use crate::GleanerError;
use crate::record::DocumentRecord;

/// Sentence present in every synthesized document.
pub const SIMULATED_MARKER: &str = "This is simulated content for demonstration purposes.";

/// Kind of page guessed from the URL path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Blog,
    Product,
    News,
    General,
}

impl ContentCategory {
    /// Classify a URL path. Earlier categories win when several match.
    pub fn from_path(path: &str) -> Self {
        if path.contains("/blog") || path.contains("/article") {
            ContentCategory::Blog
        } else if path.contains("/product") || path.contains("/shop") {
            ContentCategory::Product
        } else if path.contains("/news") || path.contains("/press") {
            ContentCategory::News
        } else {
            ContentCategory::General
        }
    }

    /// Explanation used when an error carries no message.
    fn fallback_reason(self) -> &'static str {
        match self {
            ContentCategory::Blog => "CORS restrictions",
            ContentCategory::Product => "access restrictions",
            ContentCategory::News => "content access restrictions",
            ContentCategory::General => "CORS restrictions or security policies",
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn format_date(now: OffsetDateTime) -> String {
    now.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| now.to_string())
}

fn format_date_time(now: OffsetDateTime) -> String {
    now.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"))
        .unwrap_or_else(|_| now.to_string())
}

/// Warning block naming why real extraction failed.
fn notice(category: ContentCategory, error: Option<&GleanerError>) -> String {
    let Some(error) = error else {
        return String::new();
    };

    let message = error.to_string();
    let reason = if message.trim().is_empty() { category.fallback_reason().to_string() } else { escape(message.trim()) };

    format!(
        "<div class=\"extraction-notice\" role=\"alert\">\
         <h3>Content Extraction Failed</h3>\
         <p><strong>Reason:</strong> {reason}</p>\
         <p><strong>What happened:</strong> The site refused direct access and none of the proxy relays could \
         return it, so a proxy/CORS limitation prevented real extraction.</p>\
         <p>The content below only shows what an extraction would look like.</p>\
         </div>"
    )
}

struct TemplateContext {
    host: String,
    url: String,
    date: String,
    date_time: String,
    notice: String,
}

fn blog(cx: &TemplateContext) -> String {
    let TemplateContext { host, url, date, notice, .. } = cx;
    format!(
        "<h1>Latest Blog Post from {host}</h1>\
         <p><strong>Published:</strong> {date}</p>\
         <p>This post stands in for the article at {url}.</p>\
         <h2>Understanding Web Content Extraction</h2>\
         <p>Content extraction pulls the meaningful part of a web page away from its navigation, \
         advertising and layout scaffolding, leaving text that can be read or converted.</p>\
         <h3>Key Features</h3>\
         <ul><li>Main content detection</li><li>Markdown, text and paginated output</li>\
         <li>Word and reading-time statistics</li><li>Relay fallbacks for blocked sites</li></ul>\
         <h2>How It Works</h2>\
         <ol><li>Validate the URL</li><li>Fetch directly or through a relay</li>\
         <li>Locate the main content region</li><li>Clean and annotate its markup</li>\
         <li>Convert to the requested format</li></ol>\
         {notice}\
         <p><em>Note: {SIMULATED_MARKER} A successful extraction would show the post itself.</em></p>"
    )
}

fn product(cx: &TemplateContext) -> String {
    let TemplateContext { host, url, notice, .. } = cx;
    format!(
        "<h1>Product Information from {host}</h1>\
         <div class=\"product-details\"><p><strong>Category:</strong> Web Development Tools</p>\
         <p><strong>Availability:</strong> In Stock</p><p><strong>Rating:</strong> 4.8/5</p></div>\
         <h2>Product Description</h2>\
         <p>This listing stands in for the product page at {url}.</p>\
         <h3>Highlights</h3>\
         <ul><li>Fast extraction</li><li>Several export formats</li><li>Works on most page layouts</li></ul>\
         <h2>Specifications</h2>\
         <table><tr><th>Field</th><th>Value</th></tr>\
         <tr><td>Version</td><td>2.0</td></tr>\
         <tr><td>Platforms</td><td>Web, Desktop, Terminal</td></tr>\
         <tr><td>Formats</td><td>Markdown, Text, Pages, Word</td></tr></table>\
         {notice}\
         <p><em>{SIMULATED_MARKER} Real product details would be extracted from the page.</em></p>"
    )
}

fn news(cx: &TemplateContext) -> String {
    let TemplateContext { host, url, date_time, notice, .. } = cx;
    format!(
        "<h1>Breaking News from {host}</h1>\
         <p><strong>Published:</strong> {date_time}</p>\
         <p><strong>Category:</strong> Technology</p>\
         <div class=\"news-content\">\
         <h2>Content Extraction Tool Released</h2>\
         <p><strong>{host}</strong>: this story stands in for the article at {url}.</p>\
         <h3>What Is New</h3>\
         <ul><li><strong>Content detection:</strong> finds the article body on cluttered pages</li>\
         <li><strong>Multi-format export:</strong> Markdown, text, paginated and Word output</li>\
         <li><strong>Fallbacks:</strong> relays are tried when a site blocks direct access</li></ul>\
         <blockquote><p>\"Getting clean text out of the web is still harder than it should be.\"</p></blockquote>\
         {notice}\
         <p><em>{SIMULATED_MARKER} The real news article would appear here.</em></p>\
         </div>"
    )
}

fn general(cx: &TemplateContext) -> String {
    let TemplateContext { host, url, date_time, notice, .. } = cx;
    format!(
        "<h1>Content from {host}</h1>\
         <p><strong>URL:</strong> {url}</p>\
         <p><strong>Extracted:</strong> {date_time}</p>\
         <h2>About This Page</h2>\
         <p>This page stands in for the content of {host}.</p>\
         <h2>Extraction Features</h2>\
         <ul><li><strong>Text extraction:</strong> all readable text</li>\
         <li><strong>Images:</strong> included or excluded on request</li>\
         <li><strong>Structure:</strong> headings, lists and tables are kept</li>\
         <li><strong>Links:</strong> resolved to absolute URLs</li></ul>\
         <h2>Export Options</h2>\
         <ol><li><strong>Markdown</strong> with frontmatter</li><li><strong>Paginated</strong> A4 layout</li>\
         <li><strong>Word</strong> document</li><li><strong>Plain text</strong> with statistics</li></ol>\
         {notice}\
         <p><em>Note: {SIMULATED_MARKER} The content of {url} would be shown here.</em></p>"
    )
}

/// Synthesize a placeholder record at a fixed instant.
///
/// The output depends only on the URL's host and path, the error, and `now`.
pub fn synthesize_at(url: &Url, error: Option<&GleanerError>, now: OffsetDateTime) -> DocumentRecord {
    let host = url.host_str().unwrap_or("unknown host");
    let category = ContentCategory::from_path(url.path());

    let cx = TemplateContext {
        host: escape(host),
        url: escape(url.as_str()),
        date: format_date(now),
        date_time: format_date_time(now),
        notice: notice(category, error),
    };

    let content = match category {
        ContentCategory::Blog => blog(&cx),
        ContentCategory::Product => product(&cx),
        ContentCategory::News => news(&cx),
        ContentCategory::General => general(&cx),
    };

    DocumentRecord::new(format!("Content from {host}"), url, content, Vec::new(), now).into_synthetic()
}

/// Synthesize a placeholder record stamped with the current time.
pub fn synthesize(url: &Url, error: Option<&GleanerError>) -> DocumentRecord {
    synthesize_at(url, error, OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-06 07:08:09 UTC);

    #[rstest]
    #[case("/blog/2024/post", ContentCategory::Blog)]
    #[case("/articles/rust", ContentCategory::Blog)]
    #[case("/products/widget", ContentCategory::Product)]
    #[case("/shop", ContentCategory::Product)]
    #[case("/news/today", ContentCategory::News)]
    #[case("/press-releases", ContentCategory::News)]
    #[case("/about", ContentCategory::General)]
    #[case("/", ContentCategory::General)]
    fn test_category_from_path(#[case] path: &str, #[case] expected: ContentCategory) {
        assert_eq!(ContentCategory::from_path(path), expected);
    }

    #[test]
    fn test_blog_template_with_error() {
        let url = Url::parse("https://site.com/blog/post-1").unwrap();
        let error = GleanerError::HttpStatus { status: 403 };
        let record = synthesize_at(&url, Some(&error), NOW);

        assert_eq!(record.title(), "Content from site.com");
        assert!(record.content().contains("Latest Blog Post from site.com"));
        assert!(record.content().contains("HTTP 403"));
        assert!(record.content().contains("proxy/CORS"));
        assert!(record.content().contains(SIMULATED_MARKER));
        assert!(record.images().is_empty());
        assert!(record.is_synthetic());
    }

    #[rstest]
    #[case("https://x.org/", "Content from x.org")]
    #[case("https://x.org/product/1", "Product Information from x.org")]
    #[case("https://x.org/news/1", "Breaking News from x.org")]
    #[case("https://x.org/article/1", "Latest Blog Post from x.org")]
    fn test_every_template_carries_marker(#[case] url: &str, #[case] heading: &str) {
        let url = Url::parse(url).unwrap();
        let record = synthesize_at(&url, None, NOW);
        assert!(record.content().contains(heading));
        assert!(record.content().contains(SIMULATED_MARKER));
        assert!(!record.content().contains("extraction-notice"));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let url = Url::parse("https://x.org/news/a").unwrap();
        let error = GleanerError::EmptyBody;
        let a = synthesize_at(&url, Some(&error), NOW);
        let b = synthesize_at(&url, Some(&error), NOW);
        assert_eq!(a.content(), b.content());
        assert!(a.content().contains("2024-05-06 07:08:09 UTC"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let url = Url::parse("https://x.org/").unwrap();
        let error = GleanerError::Rejected("<script>alert(1)</script>".to_string());
        let record = synthesize_at(&url, Some(&error), NOW);
        assert!(!record.content().contains("<script>"));
        assert!(record.content().contains("&lt;script&gt;"));
    }
}
