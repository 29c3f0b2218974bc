//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_exchanges", CREATE_EXCHANGES_TABLE)?;
    run_migration(conn, "002_stocks", CREATE_STOCKS_TABLE)?;
    run_migration(conn, "003_stock_prices", CREATE_STOCK_PRICES_TABLE)?;
    run_migration(conn, "004_indices", CREATE_INDICES_TABLE)?;
    run_migration(conn, "005_index_values", CREATE_INDEX_VALUES_TABLE)?;
    run_migration(conn, "006_data_sources", CREATE_DATA_SOURCES_TABLE)?;
    run_migration(conn, "007_seed_data_sources", SEED_DATA_SOURCES)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_EXCHANGES_TABLE: &str = r#"
CREATE TABLE exchanges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    country TEXT NOT NULL,
    currency TEXT NOT NULL,
    website TEXT,
    timezone TEXT,
    last_updated TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const CREATE_STOCKS_TABLE: &str = r#"
CREATE TABLE stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticker TEXT NOT NULL,
    name TEXT NOT NULL,
    sector TEXT,
    exchange_id INTEGER NOT NULL REFERENCES exchanges(id),
    currency TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    last_updated TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (ticker, exchange_id)
);
"#;

const CREATE_STOCK_PRICES_TABLE: &str = r#"
CREATE TABLE stock_prices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stock_id INTEGER NOT NULL REFERENCES stocks(id),
    date TEXT NOT NULL,
    open_price REAL,
    close_price REAL NOT NULL,
    high_price REAL,
    low_price REAL,
    volume INTEGER,
    change_percent REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (stock_id, date)
);
"#;

const CREATE_INDICES_TABLE: &str = r#"
CREATE TABLE indices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    exchange_id INTEGER NOT NULL REFERENCES exchanges(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    last_updated TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (code, exchange_id)
);
"#;

const CREATE_INDEX_VALUES_TABLE: &str = r#"
CREATE TABLE index_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    index_id INTEGER NOT NULL REFERENCES indices(id),
    date TEXT NOT NULL,
    value REAL NOT NULL,
    change_percent REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (index_id, date)
);
"#;

const CREATE_DATA_SOURCES_TABLE: &str = r#"
CREATE TABLE data_sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exchange_code TEXT NOT NULL,
    type TEXT NOT NULL,
    last_run TEXT,
    error_log TEXT,
    UNIQUE (exchange_code, type)
);
"#;

// Run-metadata rows must pre-exist; the pipeline never creates them mid-run.
const SEED_DATA_SOURCES: &str = r#"
INSERT INTO data_sources (exchange_code, type) VALUES ('JSE', 'stock');
INSERT INTO data_sources (exchange_code, type) VALUES ('NGX', 'stock');
INSERT INTO data_sources (exchange_code, type) VALUES ('BRVM', 'stock');
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let sources: i64 = conn
            .query_row("SELECT COUNT(*) FROM data_sources", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sources, 3);
    }
}
