use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use rusqlite_migration::{Migrations, M};
use tracing::{debug, error, info};

use crate::app::{RegwatchError, Result};
use crate::domain::{
    EnrichedRecord, LicenseKind, LicenseRecord, NoticeRow, PenaltyRecord, SaveReport,
    RECORD_TYPE_PENALTY,
};
use crate::normalizer::parse_date;
use crate::store::Store;

const LICENSE_COLUMNS: &str = "license_number, company_name, generated_on, legal_representative, \
     premises, business_type, business_scope, renewed_on, first_licensed_on, issued_on, \
     expires_on, remarks";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// One database file per schema name under `dir`.
    pub fn for_schema(dir: &Path, schema: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{schema}.db"));
        debug!("Opening store at {}", path.display());
        Self::new(path)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            RegwatchError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    /// Insert unseen penalties; for ones already stored only `last_seen_at` moves.
    pub fn upsert_penalties(&self, records: &[EnrichedRecord], seen_at: DateTime<Utc>) -> Result<SaveReport> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let seen_at = seen_at.to_rfc3339();
        let mut report = SaveReport::default();

        for record in records {
            match Self::upsert_penalty(&tx, record, &seen_at) {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.touched += 1,
                Err(e) => {
                    error!(
                        "Failed to save penalty ({}, {}, {}, {}): {}",
                        record.entry.province, record.entry.branch, record.entry.title, record.url(), e
                    );
                    report.failed += 1;
                }
            }
        }

        tx.commit()?;
        info!(
            "Saved penalties: {} new, {} seen again, {} failed",
            report.inserted, report.touched, report.failed
        );
        Ok(report)
    }

    /// Returns whether a new row was inserted.
    fn upsert_penalty(tx: &Transaction<'_>, record: &EnrichedRecord, seen_at: &str) -> rusqlite::Result<bool> {
        let entry = &record.entry;
        let publish_date = parse_date(&entry.date).map(|d| d.format("%Y-%m-%d").to_string());

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM penalties
                 WHERE province = ?1 AND branch = ?2 AND document_title = ?3
                   AND publish_date IS ?4 AND download_url = ?5",
                params![entry.province, entry.branch, entry.title, publish_date, entry.url],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE penalties SET last_seen_at = ?1 WHERE id = ?2",
                    params![seen_at, id],
                )?;
                Ok(false)
            }
            None => {
                tx.execute(
                    "INSERT INTO penalties
                     (province, branch, document_title, publish_date, download_url, last_seen_at, record_type)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        entry.province,
                        entry.branch,
                        entry.title,
                        publish_date,
                        entry.url,
                        seen_at,
                        RECORD_TYPE_PENALTY
                    ],
                )?;
                Ok(true)
            }
        }
    }

    fn penalty_from_row(row: &Row<'_>) -> rusqlite::Result<PenaltyRecord> {
        Ok(PenaltyRecord {
            id: row.get(0)?,
            province: row.get(1)?,
            branch: row.get(2)?,
            document_title: row.get(3)?,
            publish_date: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| parse_date(&s)),
            download_url: row.get(5)?,
            last_seen_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            record_type: row.get(7)?,
        })
    }

    fn license_from_row(row: &Row<'_>) -> rusqlite::Result<LicenseRecord> {
        Ok(LicenseRecord {
            license_number: row.get(0)?,
            company_name: row.get(1)?,
            generated_on: row.get(2)?,
            legal_representative: row.get(3)?,
            premises: row.get(4)?,
            business_type: row.get(5)?,
            business_scope: row.get(6)?,
            renewed_on: row.get(7)?,
            first_licensed_on: row.get(8)?,
            issued_on: row.get(9)?,
            expires_on: row.get(10)?,
            remarks: row.get(11)?,
        })
    }
}

impl Store for SqliteStore {
    fn save_penalties(&self, records: &[EnrichedRecord]) -> Result<SaveReport> {
        self.upsert_penalties(records, Utc::now())
    }

    fn penalties(&self, province: Option<&str>) -> Result<Vec<PenaltyRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, province, branch, document_title, publish_date, download_url, last_seen_at, record_type
             FROM penalties
             WHERE ?1 IS NULL OR province = ?1
             ORDER BY publish_date IS NULL, publish_date DESC, id",
        )?;

        let records = stmt
            .query_map(params![province], Self::penalty_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn province_counts(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT province, COUNT(*) FROM penalties GROUP BY province ORDER BY province",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn replace_licenses(&self, kind: LicenseKind, records: &[LicenseRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {} ({LICENSE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                kind.table()
            ))?;

            for r in records {
                let result = stmt.execute(params![
                    r.license_number,
                    r.company_name,
                    r.generated_on,
                    r.legal_representative,
                    r.premises,
                    r.business_type,
                    r.business_scope,
                    r.renewed_on,
                    r.first_licensed_on,
                    r.issued_on,
                    r.expires_on,
                    r.remarks
                ]);
                match result {
                    Ok(_) => written += 1,
                    Err(e) => error!("Failed to save license {:?}: {}", r, e),
                }
            }
        }

        tx.commit()?;
        info!("Wrote {} row(s) to {}", written, kind.table());
        Ok(written)
    }

    fn licenses(&self, kind: LicenseKind) -> Result<Vec<LicenseRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {LICENSE_COLUMNS} FROM {} ORDER BY license_number",
            kind.table()
        ))?;

        let records = stmt
            .query_map([], Self::license_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn replace_notices(&self, rows: &[NoticeRow]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO notices
                 (seq, licensee, permit_number, permit_title, validity, content, authority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for n in rows {
                let result = stmt.execute(params![
                    n.seq,
                    n.licensee,
                    n.permit_number,
                    n.permit_title,
                    n.validity,
                    n.content,
                    n.authority
                ]);
                match result {
                    Ok(_) => written += 1,
                    Err(e) => error!("Failed to save notice {:?}: {}", n, e),
                }
            }
        }

        tx.commit()?;
        info!("Wrote {} licence-change notice row(s)", written);
        Ok(written)
    }

    fn notices(&self) -> Result<Vec<NoticeRow>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT seq, licensee, permit_number, permit_title, validity, content, authority
             FROM notices ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(NoticeRow {
                    seq: row.get(0)?,
                    licensee: row.get(1)?,
                    permit_number: row.get(2)?,
                    permit_title: row.get(3)?,
                    validity: row.get(4)?,
                    content: row.get(5)?,
                    authority: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawEntry;
    use chrono::Duration;

    fn record(title: &str, date: &str) -> EnrichedRecord {
        EnrichedRecord::new(RawEntry::new(
            "海南省",
            "海南省分行",
            title,
            format!("https://haikou.pbc.gov.cn/{title}.html"),
            date,
        ))
    }

    #[test]
    fn test_upsert_touches_existing_row() {
        let store = SqliteStore::in_memory().unwrap();
        let first = Utc::now();
        let later = first + Duration::minutes(5);
        let batch = vec![record("a", "2024-05-01"), record("b", "")];

        let report = store.upsert_penalties(&batch, first).unwrap();
        assert_eq!(report, SaveReport { inserted: 2, touched: 0, failed: 0 });

        let report = store.upsert_penalties(&batch, later).unwrap();
        assert_eq!(report, SaveReport { inserted: 0, touched: 2, failed: 0 });

        let rows = store.penalties(None).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.last_seen_at > first));
        assert_eq!(rows[0].document_title, "a");
        assert_eq!(rows[1].publish_date, None);
        assert_eq!(rows[1].record_type, RECORD_TYPE_PENALTY);
    }

    #[test]
    fn test_changed_date_is_a_new_row() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_penalties(&[record("a", "")]).unwrap();
        let report = store.save_penalties(&[record("a", "2024-05-01")]).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(store.penalties(Some("海南省")).unwrap().len(), 2);
        assert!(store.penalties(Some("北京市")).unwrap().is_empty());
        assert_eq!(store.province_counts().unwrap(), vec![("海南省".to_string(), 2)]);
    }

    #[test]
    fn test_replace_licenses_on_conflict() {
        let store = SqliteStore::in_memory().unwrap();
        let mut license = LicenseRecord {
            license_number: "Z2000133000011".into(),
            company_name: "甲支付有限公司".into(),
            ..Default::default()
        };
        store.replace_licenses(LicenseKind::Registered, &[license.clone()]).unwrap();

        license.remarks = "已换证".into();
        store.replace_licenses(LicenseKind::Registered, &[license.clone()]).unwrap();

        let stored = store.licenses(LicenseKind::Registered).unwrap();
        assert_eq!(stored, vec![license]);
        assert!(store.licenses(LicenseKind::Revoked).unwrap().is_empty());
    }

    #[test]
    fn test_replace_notices() {
        let store = SqliteStore::in_memory().unwrap();
        let cells: Vec<String> = ["1", "甲公司", "银许〔2024〕1号"].iter().map(|s| s.to_string()).collect();
        let mut row = NoticeRow::from_cells(&cells);
        assert_eq!(store.replace_notices(&[row.clone()]).unwrap(), 1);

        row.content = "变更名称".into();
        store.replace_notices(&[row.clone()]).unwrap();
        assert_eq!(store.notices().unwrap(), vec![row]);
    }

    #[test]
    fn test_for_schema_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");
        let store = SqliteStore::for_schema(&nested, "fic").unwrap();
        store.save_penalties(&[record("a", "2024-01-01")]).unwrap();
        assert!(nested.join("fic.db").exists());
    }
}
