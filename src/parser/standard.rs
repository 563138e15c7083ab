use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::domain::RawEntry;
use crate::normalizer::branch_label;
use crate::parser::dom::{anchor_title, normalize_href, selector, text_of};
use crate::parser::PageParser;

static PAGED_PORTLETS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div.txtbox_2.portlet[opentype="page"]"#));
static PORTLETS: LazyLock<Selector> = LazyLock::new(|| selector("div.txtbox_2.portlet"));
static PORTLET_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("span.portlettitle2"));
static TXTLIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("ul.txtlist li"));
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("ul li"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("span.date"));

/// Site-chrome links that share list markup with real entries.
const CHROME_TITLES: &[&str] = &["法律声明", "联系我们", "设为首页", "加入收藏"];

/// Portlet layout used by most provincial branch sites.
pub struct StandardParser;

impl StandardParser {
    fn portlets(document: &Html) -> Vec<ElementRef<'_>> {
        let paged: Vec<_> = document.select(&PAGED_PORTLETS).collect();
        if !paged.is_empty() {
            return paged;
        }
        document.select(&PORTLETS).collect()
    }

    fn entry(li: ElementRef<'_>, page_url: &str, province: &str, branch: &str) -> Option<RawEntry> {
        let anchor = li.select(&LINK).next()?;
        let title = anchor_title(anchor);
        if CHROME_TITLES.contains(&title.as_str()) {
            return None;
        }
        let url = normalize_href(page_url, anchor.value().attr("href")?)?;
        let date = li.select(&DATE).next().map(text_of).unwrap_or_default();
        Some(RawEntry::new(province, branch, title, url, date))
    }
}

impl PageParser for StandardParser {
    fn parse(&self, document: &Html, page_url: &str, province: &str) -> Vec<RawEntry> {
        let mut items = Vec::new();

        for portlet in Self::portlets(document) {
            let heading = portlet
                .select(&PORTLET_TITLE)
                .next()
                .map(text_of)
                .unwrap_or_default();
            let branch = branch_label(&heading, province);

            let mut lis: Vec<_> = portlet.select(&TXTLIST_ITEMS).collect();
            if lis.is_empty() {
                lis = portlet.select(&LIST_ITEMS).collect();
            }

            items.extend(
                lis.into_iter()
                    .filter_map(|li| Self::entry(li, page_url, province, &branch)),
            );
        }

        items
    }
}
