//! Batch transformation
//!
//! Applies the cleaning rules across whole collections. A batch never fails:
//! each record that does not validate is logged with identifying context and
//! dropped from the output.

use crate::etl::clean::{
    clean_index, clean_price, clean_stock, CleanIndex, CleanIndexValue, CleanPrice, CleanStock,
};
use crate::scrapers::types::{RawIndex, RawPrice, RawStock};
use chrono::Utc;

/// Transform raw stock records for an exchange.
pub fn transform_stocks(raws: &[RawStock], exchange_code: &str) -> Vec<CleanStock> {
    let mut transformed = Vec::with_capacity(raws.len());
    for raw in raws {
        match clean_stock(raw, exchange_code) {
            Ok(stock) => transformed.push(stock),
            Err(e) => {
                tracing::warn!(
                    "Skipping stock {:?} on {}: {}",
                    raw.ticker.as_deref().unwrap_or("unknown"),
                    exchange_code,
                    e
                );
            }
        }
    }
    tracing::info!("Transformed {} of {} stocks for {}", transformed.len(), raws.len(), exchange_code);
    transformed
}

/// Transform raw price records for an exchange.
pub fn transform_prices(raws: &[RawPrice], exchange_code: &str) -> Vec<CleanPrice> {
    let mut transformed = Vec::with_capacity(raws.len());
    for raw in raws {
        match clean_price(raw) {
            Ok(price) => transformed.push(price),
            Err(e) => {
                tracing::warn!(
                    "Skipping price for {:?} on {}: {}",
                    raw.ticker.as_deref().unwrap_or("unknown"),
                    exchange_code,
                    e
                );
            }
        }
    }
    tracing::info!(
        "Transformed {} of {} price points for {}",
        transformed.len(),
        raws.len(),
        exchange_code
    );
    transformed
}

/// Transform raw index records for an exchange. Source rows conflate index
/// identity with the current level, so each valid row yields the index and,
/// when a level was scraped, its value record dated today.
pub fn transform_indices(
    raws: &[RawIndex],
    exchange_code: &str,
) -> (Vec<CleanIndex>, Vec<CleanIndexValue>) {
    let today = Utc::now().date_naive();
    let mut indices = Vec::with_capacity(raws.len());
    let mut values = Vec::new();

    for raw in raws {
        match clean_index(raw, today) {
            Ok((index, value)) => {
                indices.push(index);
                values.extend(value);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping index {:?} on {}: {}",
                    raw.code.as_deref().unwrap_or("unknown"),
                    exchange_code,
                    e
                );
            }
        }
    }
    tracing::info!(
        "Transformed {} indices and {} values for {}",
        indices.len(),
        values.len(),
        exchange_code
    );
    (indices, values)
}
