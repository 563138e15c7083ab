use std::sync::LazyLock;

use encoding_rs::{Encoding, GB18030, UTF_8};
use regex::Regex;

/// How far into the body a `<meta>` declaration is looked for.
const SNIFF_LEN: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#).expect("valid regex")
});

/// `charset=` parameter of a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Charset named by `<meta charset>` or `<meta http-equiv ... content="...; charset=...">`
/// near the top of the document.
fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LEN)]);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str().to_string();
    Encoding::for_label(label.as_bytes())
}

/// Pick the body's encoding: the header's charset, then a `<meta>` declaration,
/// then UTF-8 if the bytes are valid UTF-8 and GB18030 otherwise.
pub fn detect(body: &[u8], header_charset: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    header_charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| charset_from_meta(body))
        .unwrap_or_else(|| {
            if std::str::from_utf8(body).is_ok() {
                UTF_8
            } else {
                GB18030
            }
        })
}

pub fn decode(body: &[u8], header_charset: Option<&str>) -> String {
    let (text, _, _) = detect(body, header_charset).decode(body);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;

    fn gbk(text: &str) -> Vec<u8> {
        GBK.encode(text).0.into_owned()
    }

    #[test]
    fn test_content_type_charset() {
        assert_eq!(charset_from_content_type("text/html; charset=GBK"), Some("GBK"));
        assert_eq!(charset_from_content_type("text/html;charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn test_meta_charset_wins_over_bare_header() {
        let mut body = b"<html><head><meta charset=\"gbk\"></head><body><td>".to_vec();
        body.extend(gbk("公开信息名称"));
        body.extend(b"</td></body></html>");

        assert!(decode(&body, None).contains("公开信息名称"));
    }

    #[test]
    fn test_http_equiv_declaration() {
        let mut body =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=gb2312\"><p>".to_vec();
        body.extend(gbk("生成日期"));

        assert!(decode(&body, None).contains("生成日期"));
    }

    #[test]
    fn test_header_charset_takes_precedence() {
        let mut body = b"<meta charset=\"utf-8\">".to_vec();
        body.extend(gbk("行政处罚"));

        assert!(decode(&body, Some("gbk")).contains("行政处罚"));
    }

    #[test]
    fn test_undeclared_falls_back_by_content() {
        assert_eq!(decode("中国人民银行".as_bytes(), None), "中国人民银行");
        assert!(decode(&gbk("中国人民银行"), None).contains("中国人民银行"));
    }
}
