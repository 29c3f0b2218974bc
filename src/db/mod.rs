//! SQLite database module
//!
//! A single connection guarded by a mutex; entity modules expose free
//! functions over `&Connection` and the `Db` facade wraps the lock. The
//! loader drives multi-statement transactions through [`Db::with_conn`].

pub mod models;

pub mod data_source;
pub mod exchange;
pub mod index;
pub mod migrations;
pub mod price;
pub mod stock;

use crate::error::Result;
use models::{DataSource, Exchange, Stock, StockPrice};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) the database at `path` and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory database, migrated. Used by tests and the summary command's
    /// dry-run mode.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run `f` while holding the connection lock. Transactions opened inside
    /// `f` roll back on drop unless committed, which is what scopes a
    /// persistence failure to the uncommitted batch.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    // ========== Read helpers ==========

    /// Look up an exchange by code.
    pub fn exchange_by_code(&self, code: &str) -> Result<Option<Exchange>> {
        let conn = self.conn.lock();
        exchange::find_by_code(&conn, code)
    }

    /// All exchanges ordered by code.
    pub fn list_exchanges(&self) -> Result<Vec<Exchange>> {
        let conn = self.conn.lock();
        exchange::list(&conn)
    }

    /// Look up a stock by exchange code and ticker.
    pub fn stock_by_ticker(&self, exchange_code: &str, ticker: &str) -> Result<Option<Stock>> {
        let conn = self.conn.lock();
        let Some(exchange) = exchange::find_by_code(&conn, exchange_code)? else {
            return Ok(None);
        };
        stock::find(&conn, ticker, exchange.id)
    }

    /// Look up a price point by exchange code, ticker and ISO date.
    pub fn price_for(
        &self,
        exchange_code: &str,
        ticker: &str,
        date: &str,
    ) -> Result<Option<StockPrice>> {
        let conn = self.conn.lock();
        let Some(exchange) = exchange::find_by_code(&conn, exchange_code)? else {
            return Ok(None);
        };
        let Some(stock) = stock::find(&conn, ticker, exchange.id)? else {
            return Ok(None);
        };
        price::find(&conn, stock.id, date)
    }

    /// Run-metadata row for an exchange and source type.
    pub fn data_source(&self, exchange_code: &str, source_type: &str) -> Result<Option<DataSource>> {
        let conn = self.conn.lock();
        data_source::find(&conn, exchange_code, source_type)
    }

    /// Total stock count.
    pub fn count_stocks(&self) -> Result<i64> {
        let conn = self.conn.lock();
        stock::count(&conn)
    }

    /// Total price-point count.
    pub fn count_prices(&self) -> Result<i64> {
        let conn = self.conn.lock();
        price::count(&conn)
    }

    /// Total index count.
    pub fn count_indices(&self) -> Result<i64> {
        let conn = self.conn.lock();
        index::count(&conn)
    }

    /// Total index-value count.
    pub fn count_index_values(&self) -> Result<i64> {
        let conn = self.conn.lock();
        index::count_values(&conn)
    }
}
