//! Run metadata per data source
//!
//! Rows are seeded by migration and only ever updated here. A missing row is
//! reported to the caller, which warns and moves on rather than creating one
//! mid-run.

use crate::db::models::DataSource;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Find the run-metadata row for an exchange and source type.
pub fn find(
    conn: &Connection,
    exchange_code: &str,
    source_type: &str,
) -> Result<Option<DataSource>> {
    let source = conn
        .query_row(
            "SELECT id, exchange_code, type, last_run, error_log
             FROM data_sources WHERE exchange_code = ?1 AND type = ?2",
            params![exchange_code, source_type],
            |row| {
                Ok(DataSource {
                    id: row.get(0)?,
                    exchange_code: row.get(1)?,
                    source_type: row.get(2)?,
                    last_run: row.get(3)?,
                    error_log: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(source)
}

/// Record a completed run. `last_run` is set regardless of whether the run
/// accumulated errors; the error text is kept for visibility.
pub fn record_run(
    conn: &Connection,
    id: i64,
    last_run: &str,
    error_log: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE data_sources SET last_run = ?2, error_log = ?3 WHERE id = ?1",
        params![id, last_run, error_log],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_seeded_rows_and_record_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let source = find(&conn, "JSE", "stock").unwrap().unwrap();
        assert!(source.last_run.is_none());

        record_run(&conn, source.id, "2024-01-15T16:30:00Z", Some("fetch timed out")).unwrap();
        let source = find(&conn, "JSE", "stock").unwrap().unwrap();
        assert_eq!(source.last_run.as_deref(), Some("2024-01-15T16:30:00Z"));
        assert_eq!(source.error_log.as_deref(), Some("fetch timed out"));

        assert!(find(&conn, "JSE", "macro").unwrap().is_none());
    }
}
