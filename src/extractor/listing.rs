use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::domain::LicenseListing;
use crate::parser::dom::{anchor_title, selector, text_of};
use crate::parser::normalize_href;

static PAGER: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[style="padding:0 15px;"]"#));
static BOLD: LazyLock<Selector> = LazyLock::new(|| selector("b"));
static TXTLIST: LazyLock<Selector> = LazyLock::new(|| selector("ul.txtlist"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static NUMBER: LazyLock<Selector> = LazyLock::new(|| selector("span.xkzh"));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector("span.jgmc"));
static NAME_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("span.date"));

/// Page count from a registry pager, whose third `<b>` holds the total.
pub fn total_pages(html: &str) -> u32 {
    let document = Html::parse_document(html);
    document
        .select(&PAGER)
        .next()
        .and_then(|pager| pager.select(&BOLD).nth(2))
        .and_then(|b| text_of(b).parse().ok())
        .unwrap_or(1)
}

/// Rows of a registry list page. The first item is the column header.
pub fn parse_listing(html: &str, page_url: &str) -> Vec<LicenseListing> {
    let document = Html::parse_document(html);
    let Some(list) = document.select(&TXTLIST).next() else {
        return Vec::new();
    };

    list.select(&ITEM)
        .skip(1)
        .map(|li| {
            let span_text = |sel: &Selector| li.select(sel).next().map(text_of).unwrap_or_default();
            let link = li
                .select(&NAME)
                .next()
                .and_then(|span| span.select(&NAME_LINK).next());

            LicenseListing {
                license_number: span_text(&NUMBER),
                company_name: link.map(anchor_title).unwrap_or_default(),
                date: span_text(&DATE),
                detail_url: link
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| normalize_href(page_url, href)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.pbc.gov.cn/zhengwugongkai/4081783/9398ddc0-1.html";

    #[test]
    fn test_total_pages() {
        let html = r#"<span style="padding:0 15px;">共<b>52</b>条 第<b>1</b>/<b>6</b>页</span>"#;
        assert_eq!(total_pages(html), 6);
        assert_eq!(total_pages(r#"<span style="padding:0 15px;"><b>1</b></span>"#), 1);
        assert_eq!(total_pages("<p></p>"), 1);
    }

    #[test]
    fn test_parse_listing_skips_header() {
        let html = r#"
            <ul class="txtlist">
              <li><span class="xkzh">许可证编号</span><span class="jgmc">机构名称</span><span class="date">日期</span></li>
              <li>
                <span class="xkzh">Z2000133000011</span>
                <span class="jgmc"><a href="/zhengwugongkai/detail/1.html" title="甲支付有限公司">甲支付…</a></span>
                <span class="date">2024年3月1日</span>
              </li>
              <li><span class="xkzh">Z2000144000022</span><span class="jgmc">乙公司</span></li>
            </ul>"#;
        let rows = parse_listing(html, PAGE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].license_number, "Z2000133000011");
        assert_eq!(rows[0].company_name, "甲支付有限公司");
        assert_eq!(rows[0].date, "2024年3月1日");
        assert_eq!(
            rows[0].detail_url.as_deref(),
            Some("https://www.pbc.gov.cn/zhengwugongkai/detail/1.html")
        );
        assert_eq!(rows[1].company_name, "");
        assert_eq!(rows[1].detail_url, None);
    }
}
