//! Works out how many pages a listing has and the URL of each one.
//!
//! Listing pages carry one or more hidden `article_paging_list_hidden`
//! inputs holding the page count. Page links use either a `<module>-N.html`
//! or an `index_N.html` naming scheme, which is recovered from the first
//! numbered link found.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::fetcher::Fetcher;
use crate::parser::dom::selector;
use crate::parser::normalize_href;

static PAGING_MARKERS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="article_paging_list_hidden"]"#));
static PAGE_LINKS: LazyLock<Selector> = LazyLock::new(|| selector("div.list_page a[href]"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

static DASH_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)-(\d+)\.html$").expect("valid regex"));
static INDEX_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?/index)_(\d+)\.html$").expect("valid regex"));

/// A page URL with the page number cut out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    prefix: String,
    suffix: String,
}

impl PageTemplate {
    /// Split a numbered page URL into a template and the number it carries.
    pub fn from_numbered(url: &str) -> Option<(Self, u32)> {
        let caps = DASH_NUMBERED
            .captures(url)
            .or_else(|| INDEX_NUMBERED.captures(url))?;
        let digits = caps.get(2)?;
        let number = digits.as_str().parse().ok()?;
        let template = Self {
            prefix: url[..digits.start()].to_string(),
            suffix: url[digits.end()..].to_string(),
        };
        Some((template, number))
    }

    pub fn page(&self, n: u32) -> String {
        format!("{}{}{}", self.prefix, n, self.suffix)
    }
}

struct Marker<'a> {
    element: ElementRef<'a>,
    total: u32,
}

impl<'a> Marker<'a> {
    fn read(element: ElementRef<'a>) -> Self {
        let attr = |name: &str| -> Option<u32> {
            element.value().attr(name).and_then(|v| v.trim().parse().ok())
        };
        let total = attr("totalpage").or_else(|| attr("total")).unwrap_or(1);
        Self { element, total }
    }

    /// Nearest enclosing paged section: `opentype="page"` first, then any `.portlet`.
    fn container(&self) -> Option<ElementRef<'a>> {
        let ancestors = || self.element.ancestors().filter_map(ElementRef::wrap);
        ancestors()
            .find(|el| el.value().attr("opentype") == Some("page"))
            .or_else(|| ancestors().find(|el| el.value().classes().any(|c| c == "portlet")))
    }

    fn module_template(&self, base_url: &str) -> Option<PageTemplate> {
        let module_id = self.element.value().attr("moduleid")?.trim();
        if module_id.is_empty() {
            return None;
        }
        let url = Url::parse(base_url).ok()?.join(&format!("{module_id}-1.html")).ok()?;
        PageTemplate::from_numbered(url.as_str()).map(|(template, _)| template)
    }
}

fn first_template<'a>(links: impl Iterator<Item = ElementRef<'a>>, base_url: &str) -> Option<PageTemplate> {
    links
        .filter_map(|a| normalize_href(base_url, a.value().attr("href")?))
        .find_map(|href| PageTemplate::from_numbered(&href))
        .map(|(template, _)| template)
}

fn add_pages(pages: &mut BTreeSet<String>, template: &PageTemplate, total: u32, max_pages: u32) {
    for n in 2..=total.min(max_pages) {
        pages.insert(template.page(n));
    }
}

/// Page URLs for an already fetched first page. Always contains `base_url`.
pub fn pages_from_document(html: &str, base_url: &str, max_pages: u32) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut pages = BTreeSet::from([base_url.to_string()]);

    let markers: Vec<Marker<'_>> = document.select(&PAGING_MARKERS).map(Marker::read).collect();
    let mut scoped = false;

    for marker in markers.iter().filter(|m| m.total > 1) {
        let Some(container) = marker.container() else {
            continue;
        };
        let template = first_template(container.select(&PAGE_LINKS), base_url)
            .or_else(|| marker.module_template(base_url));
        if let Some(template) = template {
            add_pages(&mut pages, &template, marker.total, max_pages);
            scoped = true;
        }
    }

    if !scoped {
        let mut candidates: Vec<_> = document.select(&PAGE_LINKS).collect();
        if candidates.is_empty() {
            candidates = document.select(&ANY_LINK).collect();
        }

        let mut template = None;
        let mut highest = 1;
        for href in candidates
            .into_iter()
            .filter_map(|a| normalize_href(base_url, a.value().attr("href")?))
        {
            if let Some((found, n)) = PageTemplate::from_numbered(&href) {
                highest = highest.max(n);
                template = Some(found);
            }
        }

        if template.is_none() && base_url.ends_with("index.html") {
            template = Some(PageTemplate {
                prefix: format!("{}index_", base_url.trim_end_matches("index.html")),
                suffix: ".html".to_string(),
            });
        }

        let mut total = markers.iter().map(|m| m.total).max().unwrap_or(1);
        if total <= 1 {
            total = highest;
        }

        if let Some(template) = template {
            add_pages(&mut pages, &template, total, max_pages);
        }
    }

    pages.into_iter().collect()
}

/// Fetch the first page of a listing and enumerate its pages. A failed fetch
/// yields just the base URL.
pub async fn resolve_pages(fetcher: &dyn Fetcher, base_url: &str, max_pages: u32) -> Vec<String> {
    match fetcher.fetch_text(base_url).await {
        Some(html) => {
            let pages = pages_from_document(&html, base_url, max_pages);
            debug!("{} resolved to {} page(s)", base_url, pages.len());
            pages
        }
        None => vec![base_url.to_string()],
    }
}
