//! Idempotent loading
//!
//! Upserts canonical records by natural key: look the row up first, update
//! its mutable fields if found, insert otherwise. Commits are chunked so a
//! store failure only rolls back the uncommitted chunk, and an individual
//! bad record is skipped without aborting its batch.

use crate::config::{self, LOAD_BATCH_SIZE};
use crate::db::{self, Db};
use crate::error::Result;
use crate::etl::clean::{CleanIndex, CleanIndexValue, CleanPrice, CleanStock};
use chrono::Utc;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

/// What a load call achieved: committed records and store-level errors.
/// Record-level skips are logged, not reported here.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub processed: usize,
    pub errors: Vec<String>,
}

/// Loads canonical records into the store.
pub struct Loader {
    db: Arc<Db>,
}

impl Loader {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Upsert stock listings for an exchange, creating the exchange row from
    /// static reference config if this is the first load for its code.
    pub fn load_stocks(&self, stocks: &[CleanStock], exchange_code: &str) -> Result<LoadOutcome> {
        if stocks.is_empty() {
            tracing::warn!("No stocks to load for {}", exchange_code);
            return Ok(LoadOutcome::default());
        }

        self.db.with_conn(|conn| {
            let exchange_id = get_or_create_exchange(conn, exchange_code)?;
            let mut outcome = LoadOutcome::default();

            for chunk in stocks.chunks(LOAD_BATCH_SIZE) {
                let tx = conn.transaction()?;
                let mut chunk_count = 0;
                for stock in chunk {
                    match upsert_stock(&tx, exchange_id, stock) {
                        Ok(()) => chunk_count += 1,
                        Err(e) => {
                            tracing::error!("Error loading stock {}: {}", stock.ticker, e);
                        }
                    }
                }
                match tx.commit() {
                    Ok(()) => outcome.processed += chunk_count,
                    Err(e) => {
                        let msg =
                            format!("Database error loading stocks for {exchange_code}: {e}");
                        tracing::error!("{}", msg);
                        outcome.errors.push(msg);
                        break;
                    }
                }
            }

            tracing::info!("Loaded {} stocks for {}", outcome.processed, exchange_code);
            Ok(outcome)
        })
    }

    /// Upsert price points for an exchange. Tickers are resolved against the
    /// stocks already persisted; a price for an unknown ticker is skipped.
    pub fn load_prices(&self, prices: &[CleanPrice], exchange_code: &str) -> Result<LoadOutcome> {
        if prices.is_empty() {
            tracing::warn!("No stock prices to load for {}", exchange_code);
            return Ok(LoadOutcome::default());
        }

        self.db.with_conn(|conn| {
            let mut outcome = LoadOutcome::default();
            let Some(exchange) = db::exchange::find_by_code(conn, exchange_code)? else {
                let msg = format!("Exchange {exchange_code} not found; cannot load prices");
                tracing::error!("{}", msg);
                outcome.errors.push(msg);
                return Ok(outcome);
            };

            let tickers = db::stock::ticker_id_map(conn, exchange.id)?;
            let now = Utc::now().to_rfc3339();

            for chunk in prices.chunks(LOAD_BATCH_SIZE) {
                let tx = conn.transaction()?;
                let mut chunk_count = 0;
                for price in chunk {
                    let Some(&stock_id) = tickers.get(&price.ticker) else {
                        tracing::warn!(
                            "Stock {} not found on {}, skipping price",
                            price.ticker,
                            exchange_code
                        );
                        continue;
                    };
                    match upsert_price(&tx, stock_id, price, &now) {
                        Ok(()) => chunk_count += 1,
                        Err(e) => {
                            tracing::error!("Error loading price for {}: {}", price.ticker, e);
                        }
                    }
                }
                match tx.commit() {
                    Ok(()) => outcome.processed += chunk_count,
                    Err(e) => {
                        let msg =
                            format!("Database error loading prices for {exchange_code}: {e}");
                        tracing::error!("{}", msg);
                        outcome.errors.push(msg);
                        break;
                    }
                }
            }

            tracing::info!("Loaded {} price points for {}", outcome.processed, exchange_code);
            Ok(outcome)
        })
    }

    /// Upsert indices and their value rows in two phases: every index is
    /// persisted first so its surrogate id is known, then the values are
    /// written against the collected code -> id map.
    pub fn load_indices(
        &self,
        indices: &[CleanIndex],
        values: &[CleanIndexValue],
        exchange_code: &str,
    ) -> Result<LoadOutcome> {
        if indices.is_empty() {
            tracing::warn!("No indices to load for {}", exchange_code);
            return Ok(LoadOutcome::default());
        }

        self.db.with_conn(|conn| {
            let mut outcome = LoadOutcome::default();
            let Some(exchange) = db::exchange::find_by_code(conn, exchange_code)? else {
                let msg = format!("Exchange {exchange_code} not found; cannot load indices");
                tracing::error!("{}", msg);
                outcome.errors.push(msg);
                return Ok(outcome);
            };

            // Phase one: indices, collecting code -> id.
            let mut index_ids: HashMap<String, i64> = HashMap::new();
            let tx = conn.transaction()?;
            let mut chunk_count = 0;
            for index in indices {
                match upsert_index(&tx, exchange.id, index) {
                    Ok(id) => {
                        index_ids.insert(index.code.clone(), id);
                        chunk_count += 1;
                    }
                    Err(e) => {
                        tracing::error!("Error loading index {}: {}", index.code, e);
                    }
                }
            }
            match tx.commit() {
                Ok(()) => outcome.processed += chunk_count,
                Err(e) => {
                    let msg = format!("Database error loading indices for {exchange_code}: {e}");
                    tracing::error!("{}", msg);
                    outcome.errors.push(msg);
                    return Ok(outcome);
                }
            }

            // Phase two: values, now that every referenced id exists.
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            for value in values {
                let Some(&index_id) = index_ids.get(&value.index_code) else {
                    tracing::warn!(
                        "Index {} not found on {}, skipping value",
                        value.index_code,
                        exchange_code
                    );
                    continue;
                };
                if let Err(e) = upsert_index_value(&tx, index_id, value, &now) {
                    tracing::error!("Error loading value for index {}: {}", value.index_code, e);
                }
            }
            if let Err(e) = tx.commit() {
                let msg = format!("Database error loading index values for {exchange_code}: {e}");
                tracing::error!("{}", msg);
                outcome.errors.push(msg);
            }

            tracing::info!("Loaded {} indices for {}", outcome.processed, exchange_code);
            Ok(outcome)
        })
    }
}

/// Find an exchange by code or create it from static reference config.
fn get_or_create_exchange(conn: &Connection, exchange_code: &str) -> Result<i64> {
    if let Some(exchange) = db::exchange::find_by_code(conn, exchange_code)? {
        return Ok(exchange.id);
    }

    let now = Utc::now().to_rfc3339();
    let id = match config::exchange_info(exchange_code) {
        Some(info) => db::exchange::insert(
            conn,
            exchange_code,
            info.name,
            info.country,
            info.currency,
            info.url,
            info.timezone,
            &now,
        )?,
        None => db::exchange::insert(
            conn,
            exchange_code,
            &format!("{exchange_code} Exchange"),
            "Africa",
            config::default_currency(exchange_code),
            "",
            "UTC",
            &now,
        )?,
    };
    tracing::info!("Created new exchange record for {}", exchange_code);
    Ok(id)
}

fn upsert_stock(conn: &Connection, exchange_id: i64, stock: &CleanStock) -> Result<()> {
    let ts = stock.last_updated.to_rfc3339();
    match db::stock::find(conn, &stock.ticker, exchange_id)? {
        Some(existing) => {
            db::stock::update(
                conn,
                existing.id,
                &stock.name,
                stock.sector.as_deref(),
                Some(&stock.currency),
                &ts,
            )?;
            tracing::debug!("Updated stock {}", stock.ticker);
        }
        None => {
            db::stock::insert(
                conn,
                exchange_id,
                &stock.ticker,
                &stock.name,
                stock.sector.as_deref(),
                Some(&stock.currency),
                &ts,
            )?;
            tracing::debug!("Created new stock {}", stock.ticker);
        }
    }
    Ok(())
}

fn upsert_price(conn: &Connection, stock_id: i64, price: &CleanPrice, now: &str) -> Result<()> {
    let date = price.date.to_string();
    let fields = db::price::PriceFields {
        open_price: price.open_price,
        close_price: price.close_price,
        high_price: price.high_price,
        low_price: price.low_price,
        volume: price.volume,
        change_percent: price.change_percent,
    };
    match db::price::find(conn, stock_id, &date)? {
        Some(existing) => {
            db::price::update(conn, existing.id, &fields)?;
            tracing::debug!("Updated price for {} on {}", price.ticker, date);
        }
        None => {
            db::price::insert(conn, stock_id, &date, &fields, now)?;
            tracing::debug!("Created new price for {} on {}", price.ticker, date);
        }
    }
    Ok(())
}

fn upsert_index(conn: &Connection, exchange_id: i64, index: &CleanIndex) -> Result<i64> {
    let ts = index.last_updated.to_rfc3339();
    match db::index::find(conn, &index.code, exchange_id)? {
        Some(existing) => {
            db::index::update(conn, existing.id, &index.name, &ts)?;
            tracing::debug!("Updated index {}", index.code);
            Ok(existing.id)
        }
        None => {
            let id = db::index::insert(conn, exchange_id, &index.code, &index.name, &ts)?;
            tracing::debug!("Created new index {}", index.code);
            Ok(id)
        }
    }
}

fn upsert_index_value(
    conn: &Connection,
    index_id: i64,
    value: &CleanIndexValue,
    now: &str,
) -> Result<()> {
    let date = value.date.to_string();
    match db::index::find_value(conn, index_id, &date)? {
        Some(existing) => {
            db::index::update_value(conn, existing.id, value.value, value.change_percent)?;
            tracing::debug!("Updated value for index {} on {}", value.index_code, date);
        }
        None => {
            db::index::insert_value(conn, index_id, &date, value.value, value.change_percent, now)?;
            tracing::debug!("Created new value for index {} on {}", value.index_code, date);
        }
    }
    Ok(())
}
