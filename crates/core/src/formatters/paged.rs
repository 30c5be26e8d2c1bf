//! Paginated A4 layout.
//!
//! The record is laid out as positioned rectangles and text runs in
//! millimetres, ready for any PDF or canvas backend to paint. Tables are
//! placed first, then headings, then paragraphs and list items. Every page
//! carries a striped header band and a footer with its page number.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::formatters::text::{html_to_text, wrap_words};
use crate::record::DocumentRecord;
use crate::{GleanerError, Result};

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 20.0;
pub const CONTENT_WIDTH: f64 = 170.0;

/// Lowest baseline a line of body content may sit on.
const BOTTOM: f64 = PAGE_HEIGHT - MARGIN;
const CONTINUATION_TOP: f64 = 35.0;
const ROW_HEIGHT: f64 = 8.0;
const FOOTER_Y: f64 = 287.0;
const PT_TO_MM: f64 = 0.3528;

const STRIPES: [Rgb; 3] = [Rgb(255, 0, 110), Rgb(0, 255, 136), Rgb(0, 212, 255)];
const INK: Rgb = Rgb(0, 0, 0);
const MUTED: Rgb = Rgb(100, 100, 100);
const WHITE: Rgb = Rgb(255, 255, 255);
const HEADER_FILL: Rgb = Rgb(229, 251, 255);
const ROW_FILL: Rgb = Rgb(245, 245, 245);

static TABLES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));
static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector"));
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p, li").expect("valid selector"));

/// An sRGB fill or text colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
}

/// A positioned drawing primitive. Coordinates are millimetres from the
/// top-left corner; text `y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayoutElement {
    Rect { x: f64, y: f64, width: f64, height: f64, fill: Rgb },
    Text { x: f64, y: f64, text: String, size: f64, bold: bool, color: Rgb, align: Align },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// One-based page number
    pub number: usize,
    pub elements: Vec<LayoutElement>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self { number, elements: Vec::new() }
    }

    /// Text runs on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            LayoutElement::Text { text, .. } => Some(text.as_str()),
            LayoutElement::Rect { .. } => None,
        })
    }
}

/// A laid-out document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedDocument {
    pub width: f64,
    pub height: f64,
    pub pages: Vec<Page>,
}

/// Where body content starts on the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStyle {
    #[default]
    Standard,
    /// Leaves extra room under the header block.
    Enhanced,
}

impl PageStyle {
    fn label(self) -> &'static str {
        match self {
            PageStyle::Standard => "STANDARD",
            PageStyle::Enhanced => "ENHANCED",
        }
    }

    fn body_top(self) -> f64 {
        match self {
            PageStyle::Standard => 85.0,
            PageStyle::Enhanced => 90.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PagedConfig {
    pub style: PageStyle,
    /// Layout fails rather than produce more pages than this
    pub max_pages: usize,
}

impl Default for PagedConfig {
    fn default() -> Self {
        Self { style: PageStyle::default(), max_pages: 500 }
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: Rgb) -> LayoutElement {
    LayoutElement::Rect { x, y, width, height, fill }
}

fn text(x: f64, y: f64, text: impl Into<String>, size: f64, bold: bool, color: Rgb) -> LayoutElement {
    LayoutElement::Text { x, y, text: text.into(), size, bold, color, align: Align::Left }
}

/// Characters of average width that fit the content width at a font size.
fn line_capacity(size: f64) -> usize {
    let capacity = (CONTENT_WIDTH / (size * PT_TO_MM * 0.5)).floor();
    (capacity as usize).max(1)
}

fn wrap(content: &str, size: f64) -> Vec<String> {
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    wrap_words(&words, line_capacity(size)).lines().map(str::to_string).collect()
}

fn truncate(cell: &str, max: usize) -> String {
    cell.chars().take(max).collect()
}

/// Visible text of an element on one line.
fn flat_text(element: ElementRef<'_>) -> String {
    html_to_text(&element.inner_html()).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inside(element: ElementRef<'_>, tags: &[&str]) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| tags.contains(&ancestor.value().name()))
}

fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .select(&ROWS)
        .map(|row| row.select(&CELLS).map(|cell| flat_text(cell).trim().to_string()).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

struct Layout {
    done: Vec<Page>,
    current: Page,
    y: f64,
    max_pages: usize,
}

impl Layout {
    fn new(record: &DocumentRecord, config: &PagedConfig) -> Self {
        let mut page = Page::new(1);
        for (i, fill) in STRIPES.into_iter().enumerate() {
            page.elements.push(rect(0.0, i as f64 * 15.0, PAGE_WIDTH, 15.0, fill));
        }

        page.elements.push(text(MARGIN, 55.0, record.title(), 20.0, false, INK));
        page.elements.push(text(MARGIN, 65.0, format!("Source: {}", record.source_url()), 10.0, false, MUTED));
        page.elements.push(text(
            MARGIN,
            72.0,
            format!("Extracted: {}", record.extracted_at_rfc3339()),
            10.0,
            false,
            MUTED,
        ));
        page.elements.push(text(MARGIN, 79.0, format!("Format: {}", config.style.label()), 10.0, false, MUTED));

        Self { done: Vec::new(), current: page, y: config.style.body_top(), max_pages: config.max_pages }
    }

    fn push(&mut self, element: LayoutElement) {
        self.current.elements.push(element);
    }

    fn at_page_top(&self) -> bool {
        self.current.number > 1 && self.y <= CONTINUATION_TOP
    }

    fn break_page(&mut self) -> Result<()> {
        let number = self.current.number + 1;
        if number > self.max_pages {
            return Err(GleanerError::Layout(format!("content needs more than {} pages", self.max_pages)));
        }

        let finished = std::mem::replace(&mut self.current, Page::new(number));
        self.done.push(finished);

        for (i, fill) in STRIPES.into_iter().enumerate() {
            self.push(rect(0.0, i as f64 * 10.0, PAGE_WIDTH, 10.0, fill));
        }
        self.y = CONTINUATION_TOP;
        Ok(())
    }

    fn ensure_room(&mut self) -> Result<()> {
        if self.y > BOTTOM { self.break_page() } else { Ok(()) }
    }

    fn table(&mut self, number: usize, rows: &[Vec<String>]) -> Result<()> {
        let Some(header) = rows.first() else {
            return Ok(());
        };

        let height = rows.len() as f64 * ROW_HEIGHT + 15.0;
        if self.y + height > BOTTOM && !self.at_page_top() {
            self.break_page()?;
        }

        self.push(text(MARGIN, self.y, format!("Table {number}"), 14.0, false, INK));
        self.y += 10.0;

        let columns = header.len();
        let col_width = CONTENT_WIDTH / columns as f64;

        for (col, cell) in header.iter().enumerate() {
            let x = MARGIN + col as f64 * col_width;
            self.push(rect(x, self.y - 5.0, col_width, ROW_HEIGHT, HEADER_FILL));
            self.push(text(x + 2.0, self.y, truncate(cell, 20), 10.0, true, INK));
        }
        self.y += ROW_HEIGHT;

        for (i, row) in rows.iter().enumerate().skip(1) {
            self.ensure_room()?;
            for (col, cell) in row.iter().take(columns).enumerate() {
                let x = MARGIN + col as f64 * col_width;
                if i % 2 == 0 {
                    self.push(rect(x, self.y - 5.0, col_width, ROW_HEIGHT, ROW_FILL));
                }
                self.push(text(x + 2.0, self.y, truncate(cell, 25), 10.0, false, INK));
            }
            self.y += ROW_HEIGHT;
        }

        self.y += 10.0;
        Ok(())
    }

    fn block(&mut self, content: &str, size: f64, bold: bool, advance: f64, gap: f64) -> Result<()> {
        for line in wrap(content, size) {
            self.ensure_room()?;
            self.push(text(MARGIN, self.y, line, size, bold, INK));
            self.y += advance;
        }
        self.y += gap;
        Ok(())
    }

    /// Close the last page and stamp every footer.
    fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        let total = self.done.len();

        for page in &mut self.done {
            for (i, fill) in STRIPES.into_iter().enumerate() {
                page.elements.push(rect(i as f64 * 70.0, FOOTER_Y, 70.0, 10.0, fill));
            }
            page.elements.push(LayoutElement::Text {
                x: PAGE_WIDTH / 2.0,
                y: 293.0,
                text: format!("Page {} of {total}", page.number),
                size: 8.0,
                bold: false,
                color: WHITE,
                align: Align::Center,
            });
        }

        self.done
    }
}

/// Lay the record out on A4 pages.
pub fn layout(record: &DocumentRecord, config: &PagedConfig) -> Result<PagedDocument> {
    let fragment = Html::parse_fragment(record.content());
    let mut layout = Layout::new(record, config);

    let tables = fragment.select(&TABLES).map(table_rows).filter(|rows| !rows.is_empty());
    for (i, rows) in tables.enumerate() {
        layout.table(i + 1, &rows)?;
    }

    for heading in fragment.select(&HEADINGS).filter(|h| !inside(*h, &["table"])) {
        let level = f64::from(heading.value().name().as_bytes()[1] - b'0');
        let size = (18.0 - 2.0 * level).max(8.0);
        layout.block(&flat_text(heading), size, true, 8.0, 5.0)?;
    }

    let headings = ["table", "h1", "h2", "h3", "h4", "h5", "h6"];
    for element in fragment.select(&BODY).filter(|e| !inside(*e, &headings)) {
        let content = flat_text(element);
        if !content.is_empty() {
            layout.block(&content, 10.0, false, 6.0, 3.0)?;
        }
    }

    let pages = layout.finish();
    tracing::debug!(pages = pages.len(), "paginated layout complete");

    Ok(PagedDocument { width: PAGE_WIDTH, height: PAGE_HEIGHT, pages })
}

/// Lay the record out and serialize the layout as JSON.
pub fn convert_to_pages(record: &DocumentRecord, config: &PagedConfig) -> Result<String> {
    Ok(serde_json::to_string(&layout(record, config)?)?)
}
