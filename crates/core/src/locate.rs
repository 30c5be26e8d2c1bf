//! Main-content location.
//!
//! Finds the region of a page most likely to hold its substantive content.
//! Two passes run over the parsed tree:
//!
//! 1. A selector pass over semantic and conventional content containers
//!    (`main`, `article`, `.post-content`, ...), keeping the match with the
//!    most text.
//! 2. A generic pass over every element of the body, the body included,
//!    keeping the largest block of text whose text-to-markup ratio marks it
//!    as prose rather than layout. It only runs when the selector pass found
//!    nothing substantial, and its winner overrides the selector pass.
//!
//! When neither pass yields a candidate the document body is used.

use crate::parse::{Document, Element};

/// Content container selectors, most semantically specific first.
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    "#content",
    "#main",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".page-content",
    "main article",
    ".container .row",
    ".wrapper",
    ".page",
    ".story",
    ".text-content",
    ".prose",
];

/// Tags never considered by the generic pass. `html` and `head` are
/// scaffolding; `body` stays eligible so loose top-level prose is kept whole.
const GENERIC_EXCLUDED_TAGS: &[&str] =
    &["script", "style", "nav", "header", "footer", "aside", "noscript", "html", "head"];

/// Thresholds for the locator passes
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Minimum text length (exclusive) for a selector-pass candidate
    pub selector_min_text: usize,
    /// Selector-pass winners shorter than this trigger the generic pass
    pub selector_confident_text: usize,
    /// Minimum text length (exclusive) for a generic-pass candidate
    pub generic_min_text: usize,
    /// Minimum text-to-markup ratio (inclusive) for a generic-pass candidate
    pub generic_min_ratio: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self { selector_min_text: 200, selector_confident_text: 500, generic_min_text: 300, generic_min_ratio: 0.3 }
    }
}

/// How a region was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Matched one of [`CONTENT_SELECTORS`]
    Selector(&'static str),
    /// Largest dense text block
    Generic,
    /// Nothing qualified; the document body
    BodyFallback,
}

/// A candidate content region with its derived measurements
#[derive(Debug, Clone)]
pub struct CandidateRegion<'a> {
    /// The element itself
    pub element: Element<'a>,
    /// Characters of trimmed text content
    pub text_length: usize,
    /// Text length divided by inner markup length
    pub text_to_markup_ratio: f64,
    /// Which pass produced this region
    pub source: RegionSource,
}

impl<'a> CandidateRegion<'a> {
    fn measure(element: Element<'a>, source: RegionSource) -> Self {
        let text_length = element.text_length();
        let text_to_markup_ratio = text_ratio(text_length, element.markup_length());
        Self { element, text_length, text_to_markup_ratio, source }
    }
}

/// Text length divided by markup length, with the markup length floored at one.
pub fn text_ratio(text_length: usize, markup_length: usize) -> f64 {
    text_length as f64 / markup_length.max(1) as f64
}

/// Collect every selector match that clears the selector threshold.
///
/// Candidates come back in selector order, then document order. Selectors
/// that fail to parse are skipped.
pub fn selector_candidates<'a>(doc: &'a Document, config: &LocatorConfig) -> Vec<CandidateRegion<'a>> {
    let mut candidates = Vec::new();

    for &selector in CONTENT_SELECTORS {
        let Ok(elements) = doc.select(selector) else {
            tracing::debug!(selector, "skipping unparseable content selector");
            continue;
        };
        for element in elements {
            let text_length = element.text_length();
            if text_length > config.selector_min_text {
                candidates.push(CandidateRegion::measure(element, RegionSource::Selector(selector)));
            }
        }
    }

    candidates
}

/// Collect every element that qualifies as a dense block of text.
///
/// The ratio is only computed once an element clears the length threshold.
pub fn generic_candidates<'a>(doc: &'a Document, config: &LocatorConfig) -> Vec<CandidateRegion<'a>> {
    doc.elements()
        .filter(|element| !GENERIC_EXCLUDED_TAGS.contains(&element.tag_name().as_str()))
        .filter(|element| element.text_length() > config.generic_min_text)
        .map(|element| CandidateRegion::measure(element, RegionSource::Generic))
        .filter(|candidate| candidate.text_to_markup_ratio >= config.generic_min_ratio)
        .collect()
}

/// Best candidate: most text, first encountered on ties.
///
/// The sort is stable, so for the generic pass an outer block wins over an
/// inner one holding the same text.
fn best_by_text<'a>(mut candidates: Vec<CandidateRegion<'a>>) -> Option<CandidateRegion<'a>> {
    candidates.sort_by(|a, b| b.text_length.cmp(&a.text_length));
    candidates.into_iter().next()
}

/// Locate the main content region of a document.
///
/// Always returns a region; see the module docs for the pass order.
pub fn locate<'a>(doc: &'a Document, config: &LocatorConfig) -> CandidateRegion<'a> {
    let from_selectors = best_by_text(selector_candidates(doc, config));

    let needs_generic = from_selectors
        .as_ref()
        .is_none_or(|best| best.text_length < config.selector_confident_text);

    let region = if needs_generic {
        best_by_text(generic_candidates(doc, config)).or(from_selectors)
    } else {
        from_selectors
    };

    match region {
        Some(region) => {
            tracing::debug!(
                source = ?region.source,
                tag = %region.element.tag_name(),
                text_length = region.text_length,
                "located content region"
            );
            region
        }
        None => {
            tracing::debug!("no candidate region qualified, using document body");
            CandidateRegion::measure(doc.body(), RegionSource::BodyFallback)
        }
    }
}
