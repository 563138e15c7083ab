use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target fields on a license-registry detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseField {
    LicenseNumber,
    CompanyName,
    LegalRepresentative,
    Premises,
    BusinessType,
    BusinessScope,
    RenewalDate,
    FirstLicenseDate,
    IssueDate,
    ExpiryDate,
    Remarks,
}

pub type FieldMap = BTreeMap<LicenseField, String>;

/// Which registry a license row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseKind {
    Registered,
    Revoked,
}

impl LicenseKind {
    pub fn table(self) -> &'static str {
        match self {
            LicenseKind::Registered => "licenses_registered",
            LicenseKind::Revoked => "licenses_revoked",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LicenseKind::Registered => "已获许可机构",
            LicenseKind::Revoked => "已注销许可机构",
        }
    }
}

/// One row of a registry list page, before its detail page is visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseListing {
    pub license_number: String,
    pub company_name: String,
    pub date: String,
    pub detail_url: Option<String>,
}

impl std::fmt::Display for LicenseListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail_url {
            Some(url) => write!(f, "{url}"),
            None => write!(f, "{}", self.company_name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub license_number: String,
    pub company_name: String,
    pub generated_on: String,
    pub legal_representative: String,
    pub premises: String,
    pub business_type: String,
    pub business_scope: String,
    pub renewed_on: String,
    pub first_licensed_on: String,
    pub issued_on: String,
    pub expires_on: String,
    pub remarks: String,
}

impl LicenseRecord {
    /// Detail-page values win over what the list page showed.
    pub fn merge(listing: &LicenseListing, details: &FieldMap, generated_on: String) -> Self {
        let get = |field: LicenseField| details.get(&field).cloned().unwrap_or_default();

        Self {
            license_number: details
                .get(&LicenseField::LicenseNumber)
                .cloned()
                .unwrap_or_else(|| listing.license_number.clone()),
            company_name: details
                .get(&LicenseField::CompanyName)
                .cloned()
                .unwrap_or_else(|| listing.company_name.clone()),
            generated_on,
            legal_representative: get(LicenseField::LegalRepresentative),
            premises: get(LicenseField::Premises),
            business_type: get(LicenseField::BusinessType),
            business_scope: get(LicenseField::BusinessScope),
            renewed_on: get(LicenseField::RenewalDate),
            first_licensed_on: get(LicenseField::FirstLicenseDate),
            issued_on: get(LicenseField::IssueDate),
            expires_on: get(LicenseField::ExpiryDate),
            remarks: get(LicenseField::Remarks),
        }
    }
}

/// Number of columns in the licence-change disclosure table.
pub const NOTICE_COLUMNS: usize = 7;

/// A row of the "major licence-change" disclosure table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRow {
    pub seq: String,
    pub licensee: String,
    pub permit_number: String,
    pub permit_title: String,
    pub validity: String,
    pub content: String,
    pub authority: String,
}

impl NoticeRow {
    /// Build from raw cell texts, padding or truncating to the table width.
    pub fn from_cells(cells: &[String]) -> Self {
        let mut cells = cells.iter().cloned().take(NOTICE_COLUMNS);
        let mut next = || cells.next().unwrap_or_default();
        Self {
            seq: next(),
            licensee: next(),
            permit_number: next(),
            permit_title: next(),
            validity: next(),
            content: next(),
            authority: next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> LicenseListing {
        LicenseListing {
            license_number: "Z2000000000001".into(),
            company_name: "列表公司".into(),
            date: "2024年3月1日".into(),
            detail_url: Some("https://example.com/d.html".into()),
        }
    }

    #[test]
    fn test_merge_prefers_detail_values() {
        let mut details = FieldMap::new();
        details.insert(LicenseField::CompanyName, "详情公司".into());
        details.insert(LicenseField::ExpiryDate, "2026-05-02".into());

        let record = LicenseRecord::merge(&listing(), &details, "2024-03-01".into());
        assert_eq!(record.company_name, "详情公司");
        assert_eq!(record.license_number, "Z2000000000001");
        assert_eq!(record.expires_on, "2026-05-02");
        assert_eq!(record.generated_on, "2024-03-01");
        assert_eq!(record.remarks, "");
    }

    #[test]
    fn test_notice_row_pads_short_rows() {
        let row = NoticeRow::from_cells(&["1".to_string(), "某支付公司".to_string()]);
        assert_eq!(row.seq, "1");
        assert_eq!(row.licensee, "某支付公司");
        assert_eq!(row.authority, "");
    }

    #[test]
    fn test_notice_row_truncates_long_rows() {
        let cells: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        let row = NoticeRow::from_cells(&cells);
        assert_eq!(row.authority, "6");
    }
}
