use rusqlite::Connection;

use crate::error::Result;

/// Initialise the JobPostings table.
///
/// Safe to call on every startup; uses `IF NOT EXISTS` throughout. Column
/// names match what the ingestion script writes.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS JobPostings (
            Id            TEXT PRIMARY KEY,
            Title         TEXT NOT NULL DEFAULT '',
            Company       TEXT NOT NULL DEFAULT '',
            Location      TEXT NOT NULL DEFAULT '',
            Province      TEXT NOT NULL DEFAULT '',
            min_salary_pa INTEGER,
            max_salary_pa INTEGER,
            Skills        TEXT NOT NULL DEFAULT ''
        );",
    )?;
    Ok(())
}
