use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::domain::NoticeRow;
use crate::parser::dom::{selector, text_of};
use crate::parser::normalize_href;

static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));

/// First link whose text or title mentions `keyword`.
pub fn find_link_by_keyword(html: &str, page_url: &str, keyword: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&LINKS)
        .filter(|a| {
            text_of(*a).contains(keyword)
                || a.value().attr("title").is_some_and(|t| t.contains(keyword))
        })
        .find_map(|a| normalize_href(page_url, a.value().attr("href")?))
}

/// Data rows of the first table on a notice page, header and blank rows dropped.
pub fn parse_notice_table(html: &str) -> Vec<NoticeRow> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&TABLE).next() else {
        return Vec::new();
    };

    table
        .select(&ROW)
        .map(|tr| tr.select(&CELL).map(text_of).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .skip(1)
        .map(|cells| NoticeRow::from_cells(&cells))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_link_by_keyword() {
        let html = r#"
            <a href="a.html">其他公告</a>
            <a href="b.html" title="非银行支付机构重大事项变更许可信息公示（2024）">变更公示…</a>"#;
        let found = find_link_by_keyword(html, "https://www.pbc.gov.cn/x/index.html", "重大事项变更");
        assert_eq!(found.as_deref(), Some("https://www.pbc.gov.cn/x/b.html"));
        assert_eq!(find_link_by_keyword(html, "https://www.pbc.gov.cn/x/index.html", "不存在"), None);
    }

    #[test]
    fn test_parse_notice_table() {
        let html = r#"
            <table>
              <tr><th>序号</th><th>被许可人名称</th><th>许可文件编号</th><th>许可文件名称</th><th>有效期限</th><th>许可内容</th><th>许可机关</th></tr>
              <tr><td></td><td></td></tr>
              <tr><td>1</td><td>甲支付有限公司</td><td>银许准予决字〔2024〕第1号</td><td>准予变更决定书</td><td>长期</td><td>变更主要出资人</td><td>中国人民银行</td></tr>
              <tr><td>2</td><td>乙公司</td><td>银许〔2024〕2号</td></tr>
            </table>"#;
        let rows = parse_notice_table(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].licensee, "甲支付有限公司");
        assert_eq!(rows[0].authority, "中国人民银行");
        assert_eq!(rows[1].permit_number, "银许〔2024〕2号");
        assert_eq!(rows[1].authority, "");
    }
}
