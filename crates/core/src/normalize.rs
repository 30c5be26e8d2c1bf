//! Markup normalization of a located content region.
//!
//! Normalization re-serializes the region's children while walking the
//! immutable parsed tree:
//!
//! - subtrees matching [`EXCLUDED_SELECTORS`] are skipped,
//! - surviving structural elements get a semantic marker class appended,
//! - comments are dropped and text is re-escaped.
//!
//! The serialized fragment then has its relative links resolved against the
//! source URL and its whitespace collapsed. Images that survive the walk are
//! reported alongside the fragment.

use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::parse::Element;
use crate::record::{Dimension, ImageInfo};

/// Selectors for navigation, chrome, and advertising removed from content.
pub const EXCLUDED_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "header",
    "footer",
    ".sidebar",
    ".menu",
    ".navigation",
    ".ads",
    ".advertisement",
    ".social-media",
    ".comments",
    ".related-posts",
    ".popup",
    ".modal",
    ".cookie-notice",
    ".newsletter",
    ".banner",
    ".header",
    ".footer",
    ".metadata",
    ".author-info",
    ".tags",
    ".categories",
    ".share-buttons",
    "[class*=\"ad\"]",
    "[id*=\"ad\"]",
    "[class*=\"sidebar\"]",
    "[id*=\"sidebar\"]",
    "[class*=\"menu\"]",
    "[id*=\"menu\"]",
    "[class*=\"nav\"]",
    "[id*=\"nav\"]",
];

static EXCLUSIONS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| EXCLUDED_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()).collect());

static CAPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("caption").expect("valid selector"));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const TABLE_CAPTION: &str = "<caption class=\"table-caption\">Extracted Table Data</caption>";
const EXTERNAL_INDICATOR: &str = " <span class=\"external-indicator\">🔗</span>";

/// Options for a normalization pass
#[derive(Debug, Clone)]
pub struct NormalizeOptions<'a> {
    /// URL relative links and image sources are resolved against
    pub base_url: &'a Url,
    /// Whether to report images
    pub include_images: bool,
}

/// The cleaned, decorated content region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFragment {
    pub html: String,
    pub images: Vec<ImageInfo>,
}

/// Marker class appended to a surviving element, if any.
fn marker_class(element: ElementRef<'_>) -> Option<&'static str> {
    match element.value().name() {
        "table" => Some("extracted-table"),
        "th" => Some("table-header"),
        "td" => Some("table-cell"),
        "ul" | "ol" => Some("extracted-list"),
        "li" => Some("list-item"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("extracted-heading"),
        "p" => Some("extracted-paragraph"),
        "a" => Some("extracted-link"),
        "img" => Some("extracted-image"),
        "pre" | "code" => Some("extracted-code"),
        "blockquote" => Some("extracted-quote"),
        "div" if is_content_div(element) => Some("content-div"),
        _ => None,
    }
}

fn is_content_div(element: ElementRef<'_>) -> bool {
    element.text().collect::<String>().trim().chars().count() > 50
        || element.children().filter_map(ElementRef::wrap).any(|child| !is_excluded(child))
}

fn is_excluded(element: ElementRef<'_>) -> bool {
    EXCLUSIONS.iter().any(|selector| selector.matches(&element))
}

/// Append a class to an existing class list.
fn append_class(existing: Option<&str>, class: &str) -> String {
    format!("{} {}", existing.unwrap_or_default(), class).trim().to_string()
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

struct Normalizer<'o> {
    options: &'o NormalizeOptions<'o>,
    out: String,
    images: Vec<ImageInfo>,
}

impl Normalizer<'_> {
    fn write_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => escape_text(text, &mut self.out),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&mut self, element: ElementRef<'_>) {
        if is_excluded(element) {
            return;
        }

        let name = element.value().name();
        let marker = marker_class(element);

        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in element.value().attrs() {
            if attr == "class" && marker.is_some() {
                continue;
            }
            self.write_attr(attr, value);
        }
        if let Some(marker) = marker {
            self.write_attr("class", &append_class(element.value().attr("class"), marker));
        }
        self.out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            if name == "img" {
                self.after_image(element);
            }
            return;
        }

        if name == "table" && element.select(&CAPTION).next().is_none() && element.select(&TABLE_ROW).next().is_some()
        {
            self.out.push_str(TABLE_CAPTION);
        }

        self.write_children(element);

        if name == "a" && self.is_external(element.value().attr("href")) {
            self.out.push_str(EXTERNAL_INDICATOR);
        }

        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn write_attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        escape_attr(value, &mut self.out);
        self.out.push('"');
    }

    /// Records the image and adds a caption from its alt text.
    fn after_image(&mut self, img: ElementRef<'_>) {
        let alt = img.value().attr("alt").unwrap_or_default();

        let captioned = img
            .next_siblings()
            .find_map(ElementRef::wrap)
            .is_some_and(|next| next.value().classes().any(|class| class == "image-caption"));
        if !alt.is_empty() && !captioned {
            self.out.push_str("<div class=\"image-caption\">");
            escape_text(alt, &mut self.out);
            self.out.push_str("</div>");
        }

        if !self.options.include_images {
            return;
        }
        let src = img.value().attr("src").unwrap_or_default().trim();
        if src.is_empty() || src.starts_with("data:") {
            return;
        }
        let src = self.options.base_url.join(src).map_or_else(|_| src.to_string(), |url| url.to_string());

        self.images.push(ImageInfo {
            src,
            alt: alt.to_string(),
            width: Dimension::from_attr(img.value().attr("width")),
            height: Dimension::from_attr(img.value().attr("height")),
        });
    }

    /// Whether a link points to a different http(s) host than the source.
    fn is_external(&self, href: Option<&str>) -> bool {
        let Some(href) = href else {
            return false;
        };
        match self.options.base_url.join(href) {
            Ok(target) if matches!(target.scheme(), "http" | "https") => {
                target.host_str() != self.options.base_url.host_str()
            }
            _ => false,
        }
    }
}

/// Normalize a located content region.
///
/// The region element itself is not emitted, only its children. Never fails:
/// if URL resolution cannot rewrite the fragment, the unresolved fragment is
/// kept.
pub fn normalize(region: &Element<'_>, options: &NormalizeOptions<'_>) -> NormalizedFragment {
    let mut normalizer = Normalizer { options, out: String::new(), images: Vec::new() };
    normalizer.write_children(region.element_ref());

    let resolved = resolve_relative_urls(&normalizer.out, options.base_url);
    let html = WHITESPACE.replace_all(&resolved, " ").trim().to_string();

    NormalizedFragment { html, images: normalizer.images }
}

/// Rewrite relative `a[href]` and `img[src]` values to absolute URLs.
fn resolve_relative_urls(html: &str, base_url: &Url) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href")
                        && let Ok(absolute) = base_url.join(&href)
                    {
                        el.set_attribute("href", absolute.as_str())?;
                    }
                    Ok(())
                }),
                lol_html::element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src")
                        && !src.starts_with("data:")
                        && let Ok(absolute) = base_url.join(&src)
                    {
                        el.set_attribute("src", absolute.as_str())?;
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| output.push_str(&String::from_utf8_lossy(c)),
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        tracing::debug!("relative URL rewrite failed, keeping fragment as-is");
        return html.to_string();
    }

    output
}
