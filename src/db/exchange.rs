//! Exchange persistence

use crate::db::models::Exchange;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

fn row_to_exchange(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        country: row.get(3)?,
        currency: row.get(4)?,
        website: row.get(5)?,
        timezone: row.get(6)?,
        last_updated: row.get(7)?,
    })
}

const COLUMNS: &str = "id, code, name, country, currency, website, timezone, last_updated";

/// Find an exchange by its (already uppercased) code.
pub fn find_by_code(conn: &Connection, code: &str) -> Result<Option<Exchange>> {
    let exchange = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM exchanges WHERE code = ?1"),
            params![code],
            row_to_exchange,
        )
        .optional()?;
    Ok(exchange)
}

/// Insert a new exchange and return its id.
#[allow(clippy::too_many_arguments)]
pub fn insert(
    conn: &Connection,
    code: &str,
    name: &str,
    country: &str,
    currency: &str,
    website: &str,
    timezone: &str,
    now: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO exchanges (code, name, country, currency, website, timezone, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![code, name, country, currency, website, timezone, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List all exchanges ordered by code.
pub fn list(conn: &Connection) -> Result<Vec<Exchange>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {COLUMNS} FROM exchanges ORDER BY code"))?;
    let exchanges = stmt
        .query_map([], row_to_exchange)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_insert_and_find() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let id = insert(
            &conn,
            "JSE",
            "Johannesburg Stock Exchange",
            "South Africa",
            "ZAR",
            "https://www.jse.co.za",
            "Africa/Johannesburg",
            "2024-01-15T00:00:00Z",
        )
        .unwrap();

        let found = find_by_code(&conn, "JSE").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.currency, "ZAR");
        assert!(find_by_code(&conn, "NGX").unwrap().is_none());
    }
}
