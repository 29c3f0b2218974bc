//! Stock listing persistence
//!
//! The loader decides insert-vs-update by looking the natural key
//! (ticker, exchange_id) up first; nothing here relies on ON CONFLICT.

use crate::db::models::Stock;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

fn row_to_stock(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stock> {
    Ok(Stock {
        id: row.get(0)?,
        ticker: row.get(1)?,
        name: row.get(2)?,
        sector: row.get(3)?,
        exchange_id: row.get(4)?,
        currency: row.get(5)?,
        created_at: row.get(6)?,
        last_updated: row.get(7)?,
    })
}

const COLUMNS: &str = "id, ticker, name, sector, exchange_id, currency, created_at, last_updated";

/// Find a stock by its natural key.
pub fn find(conn: &Connection, ticker: &str, exchange_id: i64) -> Result<Option<Stock>> {
    let stock = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM stocks WHERE ticker = ?1 AND exchange_id = ?2"),
            params![ticker, exchange_id],
            row_to_stock,
        )
        .optional()?;
    Ok(stock)
}

/// Insert a new stock and return its id.
pub fn insert(
    conn: &Connection,
    exchange_id: i64,
    ticker: &str,
    name: &str,
    sector: Option<&str>,
    currency: Option<&str>,
    now: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO stocks (ticker, name, sector, exchange_id, currency, created_at, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![ticker, name, sector, exchange_id, currency, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update the mutable fields of an existing stock.
pub fn update(
    conn: &Connection,
    id: i64,
    name: &str,
    sector: Option<&str>,
    currency: Option<&str>,
    now: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE stocks SET name = ?2, sector = ?3, currency = ?4, last_updated = ?5
         WHERE id = ?1",
        params![id, name, sector, currency, now],
    )?;
    Ok(())
}

/// Map of ticker -> id for every stock on an exchange. Prefetched by the
/// price loader to avoid a lookup per price row.
pub fn ticker_id_map(conn: &Connection, exchange_id: i64) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT ticker, id FROM stocks WHERE exchange_id = ?1")?;
    let map = stmt
        .query_map(params![exchange_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(map)
}

/// Total stock count across all exchanges.
pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stocks", [], |row| row.get(0))?;
    Ok(count)
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
            "JSE",
            "Johannesburg Stock Exchange",
            "South Africa",
            "ZAR",
            "",
            "Africa/Johannesburg",
            "2024-01-15T00:00:00Z",
        )
        .unwrap();
        (conn, exchange_id)
    }

    #[test]
    fn test_find_insert_update_cycle() {
        let (conn, exchange_id) = setup();
        assert!(find(&conn, "ABC", exchange_id).unwrap().is_none());

        let id = insert(
            &conn,
            exchange_id,
            "ABC",
            "ABC Ltd",
            Some("Mining"),
            Some("ZAR"),
            "2024-01-15T00:00:00Z",
        )
        .unwrap();

        update(&conn, id, "ABC Ltd Renamed", None, Some("ZAR"), "2024-01-16T00:00:00Z").unwrap();

        let stock = find(&conn, "ABC", exchange_id).unwrap().unwrap();
        assert_eq!(stock.name, "ABC Ltd Renamed");
        assert_eq!(stock.sector, None);
        assert_eq!(count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_natural_key_is_rejected() {
        let (conn, exchange_id) = setup();
        insert(&conn, exchange_id, "ABC", "ABC Ltd", None, None, "2024-01-15T00:00:00Z").unwrap();
        let dup = insert(&conn, exchange_id, "ABC", "Other", None, None, "2024-01-15T00:00:00Z");
        assert!(dup.is_err());
    }

    #[test]
    fn test_ticker_id_map_scoped_to_exchange() {
        let (conn, exchange_id) = setup();
        let other = exchange::insert(
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
        insert(&conn, exchange_id, "ABC", "ABC Ltd", None, None, "2024-01-15T00:00:00Z").unwrap();
        insert(&conn, other, "XYZ", "XYZ Plc", None, None, "2024-01-15T00:00:00Z").unwrap();

        let map = ticker_id_map(&conn, exchange_id).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("ABC"));
    }
}
