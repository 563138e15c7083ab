use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::domain::{FieldMap, LicenseField};
use crate::fetcher::Fetcher;
use crate::normalizer::normalize_date;
use crate::parser::dom::{selector, text_of};

static TBODY: LazyLock<Selector> = LazyLock::new(|| selector("tbody"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

/// Maps a row label onto a field. A label matches when it contains any of `labels`.
pub struct FieldRule {
    pub labels: &'static [&'static str],
    pub field: LicenseField,
    pub is_date: bool,
}

impl FieldRule {
    const fn new(labels: &'static [&'static str], field: LicenseField, is_date: bool) -> Self {
        Self {
            labels,
            field,
            is_date,
        }
    }

    fn matches(&self, label: &str) -> bool {
        self.labels.iter().any(|l| label.contains(l))
    }
}

/// Checked in order; the first matching rule claims the row.
pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule::new(&["索引号", "许可证编号", "许可证号"], LicenseField::LicenseNumber, false),
    FieldRule::new(&["公开信息名称", "公司名称"], LicenseField::CompanyName, false),
    FieldRule::new(&["法定代表人（负责人）"], LicenseField::LegalRepresentative, false),
    FieldRule::new(&["住所（营业场所）"], LicenseField::Premises, false),
    FieldRule::new(&["业务类型"], LicenseField::BusinessType, false),
    FieldRule::new(&["业务覆盖范围"], LicenseField::BusinessScope, false),
    FieldRule::new(&["换证日期"], LicenseField::RenewalDate, true),
    FieldRule::new(&["首次许可日期"], LicenseField::FirstLicenseDate, true),
    FieldRule::new(&["发证日期"], LicenseField::IssueDate, true),
    FieldRule::new(&["有效期至", "有效期截止"], LicenseField::ExpiryDate, true),
    FieldRule::new(&["备注"], LicenseField::Remarks, false),
];

/// Label/value rows of the first `tbody` (or `table`) on a detail page.
pub fn extract_fields_from(html: &str) -> FieldMap {
    let document = Html::parse_document(html);
    let mut fields = FieldMap::new();

    let Some(table) = document
        .select(&TBODY)
        .next()
        .or_else(|| document.select(&TABLE).next())
    else {
        return fields;
    };

    for row in table.select(&ROW) {
        let cells: Vec<String> = row.select(&CELL).take(2).map(text_of).collect();
        let [label, value] = cells.as_slice() else {
            continue;
        };
        let Some(rule) = FIELD_RULES.iter().find(|r| r.matches(label)) else {
            continue;
        };
        let value = if rule.is_date {
            normalize_date(value)
        } else {
            value.clone()
        };
        fields.entry(rule.field).or_insert(value);
    }

    fields
}

/// Fetch a detail page and extract its fields. Fetch failures give an empty map.
pub async fn extract_fields(fetcher: &dyn Fetcher, url: &str) -> FieldMap {
    match fetcher.fetch_text(url).await {
        Some(html) => extract_fields_from(&html),
        None => FieldMap::new(),
    }
}
