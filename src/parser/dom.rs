//! Small DOM helpers shared by the page parsers and extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

pub(crate) static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Text content with each fragment trimmed, concatenated without separator.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

/// Text content with trimmed fragments joined by single spaces.
pub(crate) fn spaced_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// An anchor's `title` attribute, or its visible text when the attribute is empty.
pub(crate) fn anchor_title(anchor: ElementRef<'_>) -> String {
    anchor
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .unwrap_or_else(|| text_of(anchor))
}

/// Resolve `href` against `base`. Script links and in-page anchors resolve to nothing.
pub fn normalize_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript") || href.starts_with('#') {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

pub(crate) fn first_date_in(text: &str) -> String {
    ISO_DATE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
