use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::domain::RawEntry;
use crate::parser::dom::{anchor_title, first_date_in, normalize_href, selector, spaced_text, text_of};
use crate::parser::PageParser;

static CONTENT_RIGHT: LazyLock<Selector> = LazyLock::new(|| selector("td#content_right"));
static DATA_TABLES: LazyLock<Selector> = LazyLock::new(|| selector(r#"table[width="90%"]"#));
static CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("ul li"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("span.date"));

const HEADER_LABELS: [&str; 2] = ["公开信息名称", "生成日期"];

/// Provinces whose row fallback picks up navigation rather than records.
const ROW_FALLBACK_EXCLUDED: &[&str] = &["上海市"];

/// Older content-management layout: everything sits under `td#content_right`.
pub struct SpecialParser;

/// Accumulates entries for one page, skipping hrefs already taken.
struct PageItems<'a> {
    page_url: &'a str,
    province: &'a str,
    branch: String,
    seen: HashSet<String>,
    items: Vec<RawEntry>,
}

impl<'a> PageItems<'a> {
    fn new(page_url: &'a str, province: &'a str) -> Self {
        Self {
            page_url,
            province,
            branch: format!("{province}分行"),
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, anchor: ElementRef<'_>, date: String) -> bool {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| normalize_href(self.page_url, href))
        else {
            return false;
        };
        if !self.seen.insert(url.clone()) {
            return false;
        }
        let title = anchor_title(anchor);
        self.items
            .push(RawEntry::new(self.province, &self.branch, title, url, date));
        true
    }
}

fn is_header(table: ElementRef<'_>) -> bool {
    let labels: Vec<String> = table.select(&CELLS).map(text_of).collect();
    HEADER_LABELS
        .iter()
        .all(|label| labels.iter().any(|l| l == label))
}

/// Date in the cell following the one that holds the link.
fn adjacent_date(table: ElementRef<'_>) -> String {
    let cells: Vec<_> = table.select(&CELLS).collect();
    cells
        .iter()
        .position(|td| td.select(&LINK).next().is_some())
        .and_then(|i| cells.get(i + 1))
        .map(|td| text_of(*td))
        .unwrap_or_default()
}

impl SpecialParser {
    fn header_tables(container: ElementRef<'_>, page: &mut PageItems<'_>) {
        let mut header_seen = false;
        for table in container.select(&DATA_TABLES) {
            if is_header(table) {
                header_seen = true;
                continue;
            }
            if !header_seen {
                continue;
            }
            let Some(anchor) = table.select(&LINK).next() else {
                continue;
            };
            if anchor_title(anchor).is_empty() {
                continue;
            }
            page.push(anchor, adjacent_date(table));
        }
    }

    fn list_items(container: ElementRef<'_>, page: &mut PageItems<'_>) {
        for li in container.select(&LIST_ITEMS) {
            let Some(anchor) = li.select(&LINK).next() else {
                continue;
            };
            let date = li
                .select(&DATE)
                .next()
                .map(text_of)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| first_date_in(&spaced_text(li)));
            page.push(anchor, date);
        }
    }

    fn table_rows(container: ElementRef<'_>, page: &mut PageItems<'_>) {
        for tr in container.select(&ROWS) {
            let Some(anchor) = tr.select(&LINK).next() else {
                continue;
            };
            page.push(anchor, first_date_in(&text_of(tr)));
        }
    }
}

impl PageParser for SpecialParser {
    fn parse(&self, document: &Html, page_url: &str, province: &str) -> Vec<RawEntry> {
        let Some(container) = document.select(&CONTENT_RIGHT).next() else {
            return Vec::new();
        };

        let mut page = PageItems::new(page_url, province);
        Self::header_tables(container, &mut page);
        Self::list_items(container, &mut page);

        if page.items.is_empty() && !ROW_FALLBACK_EXCLUDED.contains(&province) {
            Self::table_rows(container, &mut page);
        }

        page.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://beijing.pbc.gov.cn/beijing/132030/132052/132059/index.html";

    fn parse(html: &str, province: &str) -> Vec<RawEntry> {
        SpecialParser.parse(&Html::parse_document(html), PAGE_URL, province)
    }

    fn data_table(href: &str, title: &str, date: &str) -> String {
        format!(
            r#"<table width="90%"><tr><td><a href="{href}" title="{title}">{title}</a></td><td>{date}</td></tr></table>"#
        )
    }

    #[test]
    fn test_header_then_data_tables() {
        let html = format!(
            r#"<table><tr><td id="content_right">
                 {}
                 <table width="90%"><tr><td>公开信息名称</td><td>生成日期</td></tr></table>
                 {}{}{}
               </td></tr></table>"#,
            data_table("/before.html", "表头之前", "2024-01-01"),
            data_table("1.html", "处罚一", "2024-03-01"),
            data_table("2.html", "处罚二", "2024-03-02"),
            data_table("3.html", "处罚三", "2024-03-03"),
        );
        let items = parse(&html, "上海市");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "处罚一");
        assert_eq!(items[0].date, "2024-03-01");
        assert_eq!(items[2].url, "https://beijing.pbc.gov.cn/beijing/132030/132052/132059/3.html");
        assert!(items.iter().all(|i| i.branch == "上海市分行"));
    }

    #[test]
    fn test_list_items_are_added_and_deduplicated() {
        let html = format!(
            r#"<table><tr><td id="content_right">
                 <table width="90%"><tr><td>公开信息名称</td><td>生成日期</td></tr></table>
                 {}
                 <ul>
                   <li><a href="1.html">重复</a></li>
                   <li><a href="4.html">列表项</a> 发布于 2024-04-04</li>
                   <li><a href="5.html">带日期</a><span class="date">2024-05-05</span></li>
                 </ul>
               </td></tr></table>"#,
            data_table("1.html", "处罚一", "2024-03-01"),
        );
        let items = parse(&html, "北京市");
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["处罚一", "列表项", "带日期"]);
        assert_eq!(items[1].date, "2024-04-04");
        assert_eq!(items[2].date, "2024-05-05");
    }

    #[test]
    fn test_row_fallback() {
        let html = r#"<table><tr><td id="content_right">
                        <table>
                          <tr><td><a href="a.html">行一</a></td><td>2023-12-31</td></tr>
                          <tr><td>无链接</td></tr>
                          <tr><td><a href="b.html" title="行二">x</a></td></tr>
                        </table>
                      </td></tr></table>"#;

        let items = parse(html, "北京市");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "行一");
        assert_eq!(items[0].date, "2023-12-31");
        assert_eq!(items[1].title, "行二");
        assert_eq!(items[1].date, "");

        assert!(parse(html, "上海市").is_empty());
    }

    #[test]
    fn test_missing_container() {
        assert!(parse("<div><ul><li><a href='x.html'>x</a></li></ul></div>", "北京市").is_empty());
    }
}
