//! Lenient HTML tree used by the locator and normalizer.
//!
//! Parsing goes through html5ever (via `scraper`), which repairs broken
//! markup, so [`Document::parse`] never rejects a page.
//!
//! ```rust
//! use gleaner_core::parse::Document;
//!
//! let doc = Document::parse("<main><article><p>Story</p></article></main>");
//! let stories = doc.select("main article").unwrap();
//! assert_eq!(stories[0].text_length(), 5);
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{GleanerError, Result};

/// A retrieved page, parsed once and queried many times.
///
/// ```rust
/// use gleaner_core::parse::Document;
///
/// let doc = Document::parse("<title> Morning Edition </title><p>News</p>");
/// assert_eq!(doc.title().as_deref(), Some("Morning Edition"));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// All matches of a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// [`GleanerError::HtmlParseError`] when the selector does not parse.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Gets the trimmed text of the `<title>` element, if present and non-blank.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Gets the `<body>` element, falling back to the root element.
    ///
    /// html5ever always synthesizes a body for documents, so the fallback only
    /// matters for unusual trees.
    pub fn body(&self) -> Element<'_> {
        Selector::parse("body")
            .ok()
            .and_then(|selector| self.html.select(&selector).next())
            .map(Element::new)
            .unwrap_or_else(|| Element::new(self.html.root_element()))
    }

    /// Every text node of the page, concatenated.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// Visits every element of the document in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap).map(Element::new)
    }
}

/// Parses a CSS selector, mapping failures into [`GleanerError::HtmlParseError`].
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| GleanerError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Borrowed handle to one element of a [`Document`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub(crate) fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// The underlying scraper element.
    pub(crate) fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }

    /// Serialized children of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Length in characters of the trimmed text content.
    pub fn text_length(&self) -> usize {
        self.text().trim().chars().count()
    }

    /// Length in characters of the serialized inner markup.
    pub fn markup_length(&self) -> usize {
        self.inner_html().chars().count()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_ascii_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head><title>Harbor Report</title></head>
        <body>
            <nav><a href="/home">Home</a></nav>
            <main>
                <h1>Tides</h1>
                <p class="lede">High water at noon.</p>
                <p class="lede">Low water at dusk.</p>
                <a href="https://tides.example.org/chart">Chart</a>
            </main>
        </body>
        </html>
    "#;

    #[test]
    fn test_title_is_trimmed() {
        let doc = Document::parse("<title>\n  Harbor Report \n</title>");
        assert_eq!(doc.title().as_deref(), Some("Harbor Report"));
    }

    #[test]
    fn test_blank_title_is_none() {
        let doc = Document::parse("<html><head><title>   </title></head><body></body></html>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_select_in_document_order() {
        let doc = Document::parse(PAGE);
        let ledes: Vec<String> = doc.select("main p.lede").unwrap().iter().map(Element::text).collect();
        assert_eq!(ledes, ["High water at noon.", "Low water at dusk."]);
    }

    #[test]
    fn test_nested_select_and_attr() {
        let doc = Document::parse(PAGE);
        let main = &doc.select("main").unwrap()[0];
        let links = main.select("a[href]").unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attr("href"), Some("https://tides.example.org/chart"));
        assert_eq!(links[0].attr("title"), None);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(PAGE);
        assert!(matches!(doc.select("[[invalid"), Err(GleanerError::HtmlParseError(_))));
        assert!(matches!(doc.body().select("p[["), Err(GleanerError::HtmlParseError(_))));
    }

    #[test]
    fn test_body_and_lengths() {
        let doc = Document::parse("<html><body><p>  hello  </p></body></html>");
        let body = doc.body();
        assert_eq!(body.tag_name(), "body");
        assert_eq!(body.text_length(), 5);
        assert_eq!(body.markup_length(), "<p>  hello  </p>".len());
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let doc = Document::parse("<div><p>unclosed <b>bold<div>nested</p>");
        assert!(doc.text_content().contains("unclosed"));
        assert!(doc.text_content().contains("nested"));
    }

    #[test]
    fn test_elements_in_document_order() {
        let doc = Document::parse(PAGE);
        let tags: Vec<String> = doc.elements().map(|el| el.tag_name()).collect();
        let nav = tags.iter().position(|t| t == "nav").unwrap();
        let h1 = tags.iter().position(|t| t == "h1").unwrap();
        assert_eq!(tags[0], "html");
        assert!(nav < h1);
    }
}
