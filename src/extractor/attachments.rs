use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::domain::Attachment;
use crate::parser::dom::{selector, text_of};
use crate::parser::normalize_href;

static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

pub const ATTACHMENT_EXTENSIONS: &[&str] =
    &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".et", ".zip", ".rar"];

fn is_attachment(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    ATTACHMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default()
        .to_string()
}

/// Downloadable documents linked from a detail page, one per URL.
pub fn collect_attachments(html: &str, page_url: &str) -> Vec<Attachment> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut attachments = Vec::new();

    for anchor in document.select(&LINKS) {
        let Some(resolved) = anchor
            .value()
            .attr("href")
            .and_then(|href| normalize_href(page_url, href))
        else {
            continue;
        };
        let Ok(url) = Url::parse(&resolved) else {
            continue;
        };
        if !is_attachment(&url) || !seen.insert(resolved.clone()) {
            continue;
        }

        let mut name = text_of(anchor);
        if name.is_empty() {
            name = file_name(&url);
        }
        attachments.push(Attachment { name, url: resolved });
    }

    attachments
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://haikou.pbc.gov.cn/haikou/132982/5432100/index.html";

    #[test]
    fn test_collects_document_links() {
        let html = r#"
            <div id="zoom">
              <a href="P020240501.pdf">行政处罚信息公示表</a>
              <a href="/haikou/files/list.XLSX"></a>
              <a href="P020240501.pdf">重复</a>
              <a href="other.html">正文</a>
              <a href="javascript:download()">下载.pdf</a>
            </div>"#;
        let found = collect_attachments(html, PAGE);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "行政处罚信息公示表");
        assert_eq!(found[0].url, "https://haikou.pbc.gov.cn/haikou/132982/5432100/P020240501.pdf");
        assert_eq!(found[1].name, "list.XLSX");
    }

    #[test]
    fn test_page_without_attachments() {
        assert!(collect_attachments("<a href='a.html'>a</a>", PAGE).is_empty());
    }
}
