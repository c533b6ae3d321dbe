use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::error::{PostingError, Result};
use crate::types::JobPosting;

const SELECT_POSTINGS: &str = "SELECT Id, Title, Company, Location, Province,
        min_salary_pa, max_salary_pa, Skills
 FROM JobPostings";

/// Thread-safe read access to the JobPostings table.
///
/// Wraps a single SQLite connection in a `Mutex`; queries are short and the
/// service runs on a single node.
pub struct PostingStore {
    db: Mutex<Connection>,
}

impl PostingStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Every stored posting, in storage order.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<JobPosting>> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = db.prepare(SELECT_POSTINGS)?;
        let rows = stmt.query_map([], row_to_posting)?;
        let postings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(count = postings.len(), "listed postings");
        Ok(postings)
    }

    /// Postings whose province equals `province` ignoring case.
    ///
    /// An empty match is reported as [`PostingError::ProvinceNotFound`],
    /// never as an empty list.
    ///
    /// Matching scans the whole table in Rust rather than in SQL, since
    /// SQLite's `lower()` only folds ASCII and names such as "Québec" need
    /// Unicode case folding. There is no province index for that reason.
    #[instrument(skip(self))]
    pub fn list_by_province(&self, province: &str) -> Result<Vec<JobPosting>> {
        let postings: Vec<JobPosting> = self
            .list_all()?
            .into_iter()
            .filter(|p| p.in_province(province))
            .collect();

        if postings.is_empty() {
            return Err(PostingError::ProvinceNotFound {
                province: province.to_string(),
            });
        }
        debug!(count = postings.len(), "province matched");
        Ok(postings)
    }

    /// Insert or update postings keyed on `id`, all in one transaction.
    ///
    /// Matched rows have every column overwritten. Returns the number of rows
    /// written.
    #[instrument(skip(self, postings), fields(count = postings.len()))]
    pub fn upsert(&self, postings: &[JobPosting]) -> Result<usize> {
        let mut db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let tx = db.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO JobPostings
                 (Id, Title, Company, Location, Province, min_salary_pa, max_salary_pa, Skills)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(Id) DO UPDATE SET
                    Title         = excluded.Title,
                    Company       = excluded.Company,
                    Location      = excluded.Location,
                    Province      = excluded.Province,
                    min_salary_pa = excluded.min_salary_pa,
                    max_salary_pa = excluded.max_salary_pa,
                    Skills        = excluded.Skills",
            )?;
            for p in postings {
                written += stmt.execute(rusqlite::params![
                    p.id,
                    p.title,
                    p.company,
                    p.location,
                    p.province,
                    p.min_salary_pa,
                    p.max_salary_pa,
                    p.skills,
                ])?;
            }
        }
        tx.commit()?;
        info!(written, "postings upserted");
        Ok(written)
    }

    /// Parse a JSON array of postings and upsert them.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let postings: Vec<JobPosting> = serde_json::from_str(json)?;
        self.upsert(&postings)
    }

    /// Number of stored postings.
    pub fn count(&self) -> Result<usize> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let n: i64 = db.query_row("SELECT COUNT(*) FROM JobPostings", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Map a SQLite row to a `JobPosting`.
fn row_to_posting(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobPosting> {
    Ok(JobPosting {
        id: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        province: row.get(4)?,
        min_salary_pa: row.get(5)?,
        max_salary_pa: row.get(6)?,
        skills: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn store() -> PostingStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        PostingStore::new(conn)
    }

    fn posting(id: &str, province: &str) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: format!("Role {id}"),
            company: "Acme".to_string(),
            location: "Somewhere".to_string(),
            province: province.to_string(),
            min_salary_pa: Some(60_000),
            max_salary_pa: Some(90_000),
            skills: "python,sql".to_string(),
        }
    }

    fn seeded() -> PostingStore {
        let s = store();
        s.upsert(&[
            posting("a", "Ontario"),
            posting("b", "ontario"),
            posting("c", "Quebec"),
        ])
        .unwrap();
        s
    }

    #[test]
    fn list_all_on_empty_store_is_empty() {
        assert!(store().list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_returns_each_record_once() {
        let s = seeded();
        let mut ids: Vec<String> = s.list_all().unwrap().into_iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn list_all_is_repeatable() {
        let s = seeded();
        assert_eq!(s.list_all().unwrap(), s.list_all().unwrap());
    }

    #[test]
    fn province_filter_is_case_insensitive() {
        let s = seeded();
        let mut ids: Vec<String> = s
            .list_by_province("ONTARIO")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn unknown_province_is_not_found() {
        let s = seeded();
        match s.list_by_province("Alberta") {
            Err(PostingError::ProvinceNotFound { province }) => assert_eq!(province, "Alberta"),
            other => panic!("expected ProvinceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn province_filter_folds_non_ascii_case() {
        let s = store();
        s.upsert(&[posting("q", "Québec")]).unwrap();
        let found = s.list_by_province("QUÉBEC").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "q");
    }

    #[test]
    fn province_filter_on_empty_store_is_not_found() {
        assert!(matches!(
            store().list_by_province("Ontario"),
            Err(PostingError::ProvinceNotFound { .. })
        ));
    }

    #[test]
    fn upsert_overwrites_matching_id() {
        let s = seeded();
        let mut moved = posting("c", "Alberta");
        moved.max_salary_pa = None;
        s.upsert(&[moved.clone()]).unwrap();

        assert_eq!(s.count().unwrap(), 3);
        assert_eq!(s.list_by_province("alberta").unwrap(), vec![moved]);
        assert!(s.list_by_province("Quebec").is_err());
    }

    #[test]
    fn null_salaries_round_trip_through_storage() {
        let s = store();
        let mut p = posting("n", "Manitoba");
        p.min_salary_pa = None;
        p.max_salary_pa = None;
        s.upsert(&[p.clone()]).unwrap();
        assert_eq!(s.list_all().unwrap(), vec![p]);
    }

    #[test]
    fn import_json_upserts_camel_case_array() {
        let s = store();
        let written = s
            .import_json(r#"[{"id":"x1","title":"Data Engineer","province":"Nova Scotia","minSalaryPa":70000}]"#)
            .unwrap();
        assert_eq!(written, 1);
        let found = s.list_by_province("nova scotia").unwrap();
        assert_eq!(found[0].min_salary_pa, Some(70_000));
    }

    #[test]
    fn import_json_rejects_non_array() {
        assert!(matches!(
            store().import_json(r#"{"id":"x1"}"#),
            Err(PostingError::Serialization(_))
        ));
    }

    #[test]
    fn broken_schema_surfaces_database_error() {
        let s = PostingStore::new(Connection::open_in_memory().unwrap());
        assert!(matches!(s.list_all(), Err(PostingError::Database(_))));
    }
}
