//! Stock price persistence

use crate::db::models::StockPrice;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

fn row_to_price(row: &rusqlite::Row<'_>) -> rusqlite::Result<StockPrice> {
    Ok(StockPrice {
        id: row.get(0)?,
        stock_id: row.get(1)?,
        date: row.get(2)?,
        open_price: row.get(3)?,
        close_price: row.get(4)?,
        high_price: row.get(5)?,
        low_price: row.get(6)?,
        volume: row.get(7)?,
        change_percent: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const COLUMNS: &str = "id, stock_id, date, open_price, close_price, high_price, low_price, \
                       volume, change_percent, created_at";

/// Price fields written on insert or update, minus the natural key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceFields {
    pub open_price: Option<f64>,
    pub close_price: f64,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub volume: Option<i64>,
    pub change_percent: Option<f64>,
}

/// Find a price point by its natural key (stock, ISO date).
pub fn find(conn: &Connection, stock_id: i64, date: &str) -> Result<Option<StockPrice>> {
    let price = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM stock_prices WHERE stock_id = ?1 AND date = ?2"),
            params![stock_id, date],
            row_to_price,
        )
        .optional()?;
    Ok(price)
}

/// Insert a new price point.
pub fn insert(
    conn: &Connection,
    stock_id: i64,
    date: &str,
    fields: &PriceFields,
    now: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO stock_prices
            (stock_id, date, open_price, close_price, high_price, low_price,
             volume, change_percent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            stock_id,
            date,
            fields.open_price,
            fields.close_price,
            fields.high_price,
            fields.low_price,
            fields.volume,
            fields.change_percent,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the mutable fields of an existing price point.
pub fn update(conn: &Connection, id: i64, fields: &PriceFields) -> Result<()> {
    conn.execute(
        "UPDATE stock_prices SET open_price = ?2, close_price = ?3, high_price = ?4,
             low_price = ?5, volume = ?6, change_percent = ?7
         WHERE id = ?1",
        params![
            id,
            fields.open_price,
            fields.close_price,
            fields.high_price,
            fields.low_price,
            fields.volume,
            fields.change_percent
        ],
    )?;
    Ok(())
}

/// Total price-point count.
pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stock_prices", [], |row| row.get(0))?;
    Ok(count)
}

/// A stock's movement on the latest stored trading day, for the summary report.
#[derive(Debug, Clone)]
pub struct Mover {
    pub ticker: String,
    pub name: String,
    pub change_percent: f64,
}

/// Stocks on the latest stored date for an exchange, ordered by change
/// percent descending. Rows without a change percent are excluded.
pub fn latest_movers(conn: &Connection, exchange_id: i64) -> Result<Vec<Mover>> {
    let mut stmt = conn.prepare(
        "SELECT s.ticker, s.name, p.change_percent
         FROM stock_prices p
         JOIN stocks s ON s.id = p.stock_id
         WHERE s.exchange_id = ?1
           AND p.change_percent IS NOT NULL
           AND p.date = (
               SELECT MAX(pp.date) FROM stock_prices pp
               JOIN stocks ss ON ss.id = pp.stock_id
               WHERE ss.exchange_id = ?1
           )
         ORDER BY p.change_percent DESC",
    )?;
    let movers = stmt
        .query_map(params![exchange_id], |row| {
            Ok(Mover {
                ticker: row.get(0)?,
                name: row.get(1)?,
                change_percent: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(movers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{exchange, migrations::run_migrations, stock};

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
        let stock_id = stock::insert(
            &conn,
            exchange_id,
            "ABC",
            "ABC Ltd",
            None,
            Some("ZAR"),
            "2024-01-15T00:00:00Z",
        )
        .unwrap();
        (conn, stock_id)
    }

    #[test]
    fn test_upsert_by_stock_and_date() {
        let (conn, stock_id) = setup();
        let fields = PriceFields { close_price: 45.0, ..Default::default() };
        let id = insert(&conn, stock_id, "2024-01-15", &fields, "2024-01-15T00:00:00Z").unwrap();

        let updated = PriceFields { close_price: 46.5, volume: Some(2500), ..Default::default() };
        update(&conn, id, &updated).unwrap();

        let price = find(&conn, stock_id, "2024-01-15").unwrap().unwrap();
        assert_eq!(price.close_price, 46.5);
        assert_eq!(price.volume, Some(2500));
        assert_eq!(count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_date_is_rejected() {
        let (conn, stock_id) = setup();
        let fields = PriceFields { close_price: 45.0, ..Default::default() };
        insert(&conn, stock_id, "2024-01-15", &fields, "2024-01-15T00:00:00Z").unwrap();
        assert!(insert(&conn, stock_id, "2024-01-15", &fields, "2024-01-15T00:00:00Z").is_err());
    }
}
