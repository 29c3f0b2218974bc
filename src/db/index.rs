//! Market index and index value persistence

use crate::db::models::{IndexValue, MarketIndex};
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

fn row_to_index(row: &rusqlite::Row<'_>) -> rusqlite::Result<MarketIndex> {
    Ok(MarketIndex {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        exchange_id: row.get(3)?,
        created_at: row.get(4)?,
        last_updated: row.get(5)?,
    })
}

/// Find an index by its natural key (code, exchange).
pub fn find(conn: &Connection, code: &str, exchange_id: i64) -> Result<Option<MarketIndex>> {
    let index = conn
        .query_row(
            "SELECT id, code, name, exchange_id, created_at, last_updated
             FROM indices WHERE code = ?1 AND exchange_id = ?2",
            params![code, exchange_id],
            row_to_index,
        )
        .optional()?;
    Ok(index)
}

/// Insert a new index and return its id. The id is needed before any of the
/// index's value rows can be written.
pub fn insert(
    conn: &Connection,
    exchange_id: i64,
    code: &str,
    name: &str,
    now: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO indices (code, name, exchange_id, created_at, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![code, name, exchange_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update the mutable fields of an existing index.
pub fn update(conn: &Connection, id: i64, name: &str, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE indices SET name = ?2, last_updated = ?3 WHERE id = ?1",
        params![id, name, now],
    )?;
    Ok(())
}

/// Find an index value by its natural key (index, ISO date).
pub fn find_value(conn: &Connection, index_id: i64, date: &str) -> Result<Option<IndexValue>> {
    let value = conn
        .query_row(
            "SELECT id, index_id, date, value, change_percent, created_at
             FROM index_values WHERE index_id = ?1 AND date = ?2",
            params![index_id, date],
            |row| {
                Ok(IndexValue {
                    id: row.get(0)?,
                    index_id: row.get(1)?,
                    date: row.get(2)?,
                    value: row.get(3)?,
                    change_percent: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(value)
}

/// Insert a new index value.
pub fn insert_value(
    conn: &Connection,
    index_id: i64,
    date: &str,
    value: f64,
    change_percent: Option<f64>,
    now: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO index_values (index_id, date, value, change_percent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![index_id, date, value, change_percent, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite an existing index value.
pub fn update_value(
    conn: &Connection,
    id: i64,
    value: f64,
    change_percent: Option<f64>,
) -> Result<()> {
    conn.execute(
        "UPDATE index_values SET value = ?2, change_percent = ?3 WHERE id = ?1",
        params![id, value, change_percent],
    )?;
    Ok(())
}

/// Total index count.
pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM indices", [], |row| row.get(0))?;
    Ok(count)
}

/// Total index-value count.
pub fn count_values(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM index_values", [], |row| row.get(0))?;
    Ok(count)
}

/// An index with its most recent stored level, for the summary report.
#[derive(Debug, Clone)]
pub struct LatestLevel {
    pub code: String,
    pub name: String,
    pub date: String,
    pub value: f64,
    pub change_percent: Option<f64>,
}

/// Latest stored level of every index on an exchange.
pub fn latest_levels(conn: &Connection, exchange_id: i64) -> Result<Vec<LatestLevel>> {
    let mut stmt = conn.prepare(
        "SELECT i.code, i.name, v.date, v.value, v.change_percent
         FROM indices i
         JOIN index_values v ON v.index_id = i.id
         WHERE i.exchange_id = ?1
           AND v.date = (SELECT MAX(vv.date) FROM index_values vv WHERE vv.index_id = i.id)
         ORDER BY i.code",
    )?;
    let levels = stmt
        .query_map(params![exchange_id], |row| {
            Ok(LatestLevel {
                code: row.get(0)?,
                name: row.get(1)?,
                date: row.get(2)?,
                value: row.get(3)?,
                change_percent: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{exchange, migrations::run_migrations};

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let exchange_id = exchange::insert(
            &conn,
            "NGX",
            "Nigerian Exchange Group",
            "Nigeria",
            "NGN",
            "",
            "Africa/Lagos",
            "2024-01-15T00:00:00Z",
        )
        .unwrap();
        (conn, exchange_id)
    }

    #[test]
    fn test_index_then_value_by_id() {
        let (conn, exchange_id) = setup();
        let index_id =
            insert(&conn, exchange_id, "NGXASI", "NGX All-Share Index", "2024-01-15T00:00:00Z")
                .unwrap();
        insert_value(&conn, index_id, "2024-01-15", 104_520.1, Some(0.35), "2024-01-15T00:00:00Z")
            .unwrap();

        let value = find_value(&conn, index_id, "2024-01-15").unwrap().unwrap();
        assert_eq!(value.value, 104_520.1);

        update_value(&conn, value.id, 104_600.0, Some(0.42)).unwrap();
        let value = find_value(&conn, index_id, "2024-01-15").unwrap().unwrap();
        assert_eq!(value.value, 104_600.0);
        assert_eq!(count_values(&conn).unwrap(), 1);
    }

    #[test]
    fn test_same_code_allowed_on_different_exchanges() {
        let (conn, exchange_id) = setup();
        let other = exchange::insert(
            &conn,
            "JSE",
            "Johannesburg Stock Exchange",
            "South Africa",
            "ZAR",
            "",
            "Africa/Johannesburg",
            "2024-01-15T00:00:00Z",
        )
        .unwrap();
        insert(&conn, exchange_id, "TOP40", "Top 40", "2024-01-15T00:00:00Z").unwrap();
        insert(&conn, other, "TOP40", "Top 40", "2024-01-15T00:00:00Z").unwrap();
        assert_eq!(count(&conn).unwrap(), 2);
    }
}
